use serde::{Deserialize, Serialize};

/// Color class of a stimulus. The concrete RGBA values come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusColor {
    Target,
    Distractor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn opposite(self) -> Self {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }

    /// Width and height of a rectangle with the given edges in this orientation.
    pub fn extent(self, long_edge: f32, short_edge: f32) -> (f32, f32) {
        match self {
            Orientation::Vertical => (short_edge, long_edge),
            Orientation::Horizontal => (long_edge, short_edge),
        }
    }
}

/// One rectangle of a search display, before it is given a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusDescriptor {
    pub color: StimulusColor,
    pub orientation: Orientation,
    pub is_target: bool,
}

impl StimulusDescriptor {
    pub fn distractor(color: StimulusColor, orientation: Orientation) -> Self {
        Self {
            color,
            orientation,
            is_target: false,
        }
    }

    pub fn target(orientation: Orientation) -> Self {
        Self {
            color: StimulusColor::Target,
            orientation,
            is_target: true,
        }
    }
}

/// Center of a stimulus in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
}

/// Render data for one rectangle: what the presentation layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedStimulus {
    pub color: StimulusColor,
    pub orientation: Orientation,
    pub is_target: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rgba: [u8; 4],
}

impl PlacedStimulus {
    pub fn new(
        descriptor: StimulusDescriptor,
        placement: Placement,
        long_edge: f32,
        short_edge: f32,
        rgba: [u8; 4],
    ) -> Self {
        let (width, height) = descriptor.orientation.extent(long_edge, short_edge);
        Self {
            color: descriptor.color,
            orientation: descriptor.orientation,
            is_target: descriptor.is_target,
            x: placement.x,
            y: placement.y,
            width,
            height,
            rgba,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_swaps_edges_with_orientation() {
        assert_eq!(Orientation::Vertical.extent(80.0, 40.0), (40.0, 80.0));
        assert_eq!(Orientation::Horizontal.extent(80.0, 40.0), (80.0, 40.0));
    }

    #[test]
    fn placed_stimulus_takes_size_from_orientation() {
        let placed = PlacedStimulus::new(
            StimulusDescriptor::target(Orientation::Vertical),
            Placement { x: 10.0, y: 20.0 },
            80.0,
            40.0,
            [255, 0, 0, 255],
        );
        assert!(placed.is_target);
        assert_eq!((placed.width, placed.height), (40.0, 80.0));
        assert_eq!((placed.x, placed.y), (10.0, 20.0));
    }
}
