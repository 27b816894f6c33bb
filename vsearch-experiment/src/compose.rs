//! Builds the multiset of rectangles shown in one search display.
//!
//! Half of the rectangles (rounded up) take the target color. Within the
//! target color only the target itself may use the target orientation; the
//! rest are turned the other way. The distractor color is split between the
//! two orientations as evenly as integer division allows.

use rand::Rng;
use vsearch_core::{Orientation, StimulusColor, StimulusDescriptor};

use crate::random::shuffle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StimulusComposer {
    target_orientation: Orientation,
}

impl StimulusComposer {
    pub fn new(target_orientation: Orientation) -> Self {
        Self { target_orientation }
    }

    /// Exactly `set_size` descriptors in shuffled order.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        set_size: u32,
        target_present: bool,
        rng: &mut R,
    ) -> Vec<StimulusDescriptor> {
        let set_size = set_size as usize;
        let flipped = self.target_orientation.opposite();
        let mut target_colored = set_size.div_ceil(2);
        let mut stimuli = Vec::with_capacity(set_size);

        if target_present && set_size > 0 {
            stimuli.push(StimulusDescriptor::target(self.target_orientation));
            target_colored = target_colored.saturating_sub(1);
        }
        for _ in 0..target_colored {
            stimuli.push(StimulusDescriptor::distractor(StimulusColor::Target, flipped));
        }

        let remaining = set_size - stimuli.len();
        let vertical = remaining / 2;
        let horizontal = remaining - vertical;
        for _ in 0..vertical {
            stimuli.push(StimulusDescriptor::distractor(
                StimulusColor::Distractor,
                Orientation::Vertical,
            ));
        }
        for _ in 0..horizontal {
            stimuli.push(StimulusDescriptor::distractor(
                StimulusColor::Distractor,
                Orientation::Horizontal,
            ));
        }

        shuffle(&mut stimuli, rng);
        stimuli
    }
}
