use std::path::Path;

use serde::{Deserialize, Serialize};
use vsearch_core::{Orientation, TrialPhase};

use crate::error::{ConfigError, Result};
use crate::input::normalize_key_name;
use crate::layout::{Layout, PlacementStrategy};

/// Static session parameters. Fixed before a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub set_sizes: Vec<u32>,
    pub durations_ms: Vec<u64>,
    pub practice_reps_per_condition: u32,
    pub main_reps_per_condition: u32,
    pub block_size: u32,
    pub fixation_range_ms: (u64, u64),
    pub decision_deadline_ms: u64,
    pub end_screen_ms: u64,
    pub stimulus: StimulusConfig,
    pub keys: KeyConfig,
    pub display: DisplayConfig,
    pub text: TextConfig,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    pub target_color: [u8; 4],
    pub distractor_color: [u8; 4],
    pub target_orientation: Orientation,
    pub long_edge: f32,
    pub short_edge: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub target_present: String,
    pub target_absent: String,
    pub advance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategyKind {
    RejectionSampling,
    Grid,
}

impl PlacementStrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlacementStrategyKind::RejectionSampling => "rejection-sampling",
            PlacementStrategyKind::Grid => "grid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: f32,
    pub height: f32,
    /// Fraction of each viewport edge left empty on both sides.
    pub margin_fraction: f32,
    pub padding: f32,
    pub placement: PlacementStrategyKind,
    pub max_attempts: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub instructions: Vec<String>,
    pub ready: String,
    pub rest: String,
    pub end: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            set_sizes: vec![2, 6, 12, 18, 24, 30],
            durations_ms: vec![200, 400, 600],
            practice_reps_per_condition: 2,
            main_reps_per_condition: 10,
            block_size: 60,
            fixation_range_ms: (600, 800),
            decision_deadline_ms: 3000,
            end_screen_ms: 3000,
            stimulus: StimulusConfig::default(),
            keys: KeyConfig::default(),
            display: DisplayConfig::default(),
            text: TextConfig::default(),
            seed: None,
        }
    }
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            target_color: [255, 0, 0, 255],
            distractor_color: [0, 128, 0, 255],
            target_orientation: Orientation::Vertical,
            long_edge: 80.0,
            short_edge: 40.0,
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            target_present: "f".to_string(),
            target_absent: "j".to_string(),
            advance: "space".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            margin_fraction: 0.1,
            padding: 10.0,
            placement: PlacementStrategyKind::RejectionSampling,
            max_attempts: 5000,
            grid_rows: 5,
            grid_cols: 6,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            instructions: vec![
                "Practice instructions, page 1.\n\nPress space to continue.".to_string(),
                "A vertical red rectangle is the target. After each display, press F if the \
                 target was shown and J if it was not.\n\nPress space to start the practice."
                    .to_string(),
            ],
            ready: "The main experiment starts now. Answer as quickly and accurately as you \
                    can.\n\nPress space to begin."
                .to_string(),
            rest: "This block is over. Take a short break and press space when you are ready."
                .to_string(),
            end: "All trials are complete. Thank you for taking part!".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn usable_width(&self) -> f32 {
        self.width * (1.0 - 2.0 * self.margin_fraction)
    }

    pub fn usable_height(&self) -> f32 {
        self.height * (1.0 - 2.0 * self.margin_fraction)
    }
}

impl ExperimentConfig {
    /// Reads a JSON file; fields it omits keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn reps_for(&self, phase: TrialPhase) -> u32 {
        match phase {
            TrialPhase::Practice => self.practice_reps_per_condition,
            TrialPhase::Main => self.main_reps_per_condition,
        }
    }

    /// Number of trials one phase generates.
    pub fn trial_count(&self, phase: TrialPhase) -> usize {
        self.set_sizes.len() * self.durations_ms.len() * self.reps_for(phase) as usize
    }

    pub fn block_count(&self) -> usize {
        if self.block_size == 0 {
            return 0;
        }
        self.trial_count(TrialPhase::Main)
            .div_ceil(self.block_size as usize)
    }

    pub fn max_set_size(&self) -> u32 {
        self.set_sizes.iter().copied().max().unwrap_or(0)
    }

    /// Largest footprint a stimulus can take in either orientation, plus padding.
    pub fn stimulus_pitch(&self) -> f32 {
        self.stimulus.long_edge + self.display.padding
    }

    /// Number of stimuli the configured placement strategy can always place.
    pub fn placement_capacity(&self) -> usize {
        Layout::from_config(self).capacity()
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.set_sizes.is_empty() {
            return Err(ConfigError::EmptySetSizes);
        }
        if self.set_sizes.contains(&0) {
            return Err(ConfigError::ZeroSetSize);
        }
        if self.durations_ms.is_empty() {
            return Err(ConfigError::EmptyDurations);
        }
        if self.durations_ms.contains(&0) {
            return Err(ConfigError::ZeroDuration);
        }
        for phase in [TrialPhase::Practice, TrialPhase::Main] {
            let reps = self.reps_for(phase);
            if reps == 0 || reps % 2 != 0 {
                return Err(ConfigError::InvalidRepetitions { phase, reps });
            }
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        let (min, max) = self.fixation_range_ms;
        if min > max {
            return Err(ConfigError::FixationRange { min, max });
        }
        if self.decision_deadline_ms == 0 {
            return Err(ConfigError::ZeroDeadline);
        }
        self.validate_keys()?;
        self.validate_geometry()
    }

    fn validate_keys(&self) -> std::result::Result<(), ConfigError> {
        let mut seen: Vec<String> = Vec::with_capacity(3);
        for raw in [
            &self.keys.target_present,
            &self.keys.target_absent,
            &self.keys.advance,
        ] {
            let key = normalize_key_name(raw).ok_or_else(|| ConfigError::InvalidKey(raw.clone()))?;
            if seen.contains(&key) {
                return Err(ConfigError::DuplicateKey(key));
            }
            seen.push(key);
        }
        Ok(())
    }

    fn validate_geometry(&self) -> std::result::Result<(), ConfigError> {
        let stim = &self.stimulus;
        if !(stim.short_edge > 0.0 && stim.short_edge <= stim.long_edge) {
            return Err(ConfigError::StimulusGeometry {
                long: stim.long_edge,
                short: stim.short_edge,
            });
        }
        let display = &self.display;
        if !(0.0..0.5).contains(&display.margin_fraction) {
            return Err(ConfigError::Margin(display.margin_fraction));
        }
        if display.padding < 0.0 {
            return Err(ConfigError::Padding(display.padding));
        }
        let (width, height) = (display.usable_width(), display.usable_height());
        if width < stim.long_edge || height < stim.long_edge {
            return Err(ConfigError::ViewportTooSmall {
                width,
                height,
                footprint: stim.long_edge,
            });
        }

        match display.placement {
            PlacementStrategyKind::Grid => {
                let needed = self.stimulus_pitch();
                let (rows, cols) = (display.grid_rows, display.grid_cols);
                let (cell_width, cell_height) = if rows == 0 || cols == 0 {
                    (0.0, 0.0)
                } else {
                    (width / cols as f32, height / rows as f32)
                };
                if cell_width < needed || cell_height < needed {
                    return Err(ConfigError::GridTooSmall {
                        rows,
                        cols,
                        cell_width,
                        cell_height,
                        needed,
                    });
                }
            }
            PlacementStrategyKind::RejectionSampling => {
                if display.max_attempts == 0 {
                    return Err(ConfigError::ZeroAttempts);
                }
            }
        }

        let capacity = self.placement_capacity();
        let set_size = self.max_set_size();
        if set_size as usize > capacity {
            return Err(ConfigError::CapacityExceeded {
                set_size,
                capacity,
                strategy: display.placement.name(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.trial_count(TrialPhase::Practice), 36);
        assert_eq!(config.trial_count(TrialPhase::Main), 180);
        assert_eq!(config.block_count(), 3);
    }

    #[test]
    fn odd_repetitions_are_rejected() {
        let config = ExperimentConfig {
            main_reps_per_condition: 5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRepetitions {
                phase: TrialPhase::Main,
                reps: 5
            })
        );
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let config = ExperimentConfig {
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlockSize));
        assert_eq!(config.block_count(), 0);
    }

    #[test]
    fn inverted_fixation_range_is_rejected() {
        let config = ExperimentConfig {
            fixation_range_ms: (900, 600),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FixationRange { min: 900, max: 600 })
        ));
    }

    #[test]
    fn response_keys_must_differ_case_insensitively() {
        let mut config = ExperimentConfig::default();
        config.keys.target_absent = "F".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateKey("f".to_string()))
        );
    }

    #[test]
    fn advance_key_cannot_double_as_response() {
        let mut config = ExperimentConfig::default();
        config.keys.target_present = " ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateKey("space".to_string()))
        );
    }

    #[test]
    fn default_grid_holds_largest_set_size() {
        let mut config = ExperimentConfig::default();
        config.display.placement = PlacementStrategyKind::Grid;
        assert_eq!(config.placement_capacity(), 30);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn grid_capacity_is_enforced() {
        let mut config = ExperimentConfig::default();
        config.display.placement = PlacementStrategyKind::Grid;
        config.set_sizes.push(36);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityExceeded {
                set_size: 36,
                capacity: 30,
                ..
            })
        ));
    }

    #[test]
    fn rejection_capacity_shrinks_with_the_viewport() {
        let mut config = ExperimentConfig::default();
        config.display.width = 640.0;
        config.display.height = 480.0;
        // centers span 432 x 304, lattice spacing 198
        let capacity = config.placement_capacity();
        assert!((1..=6).contains(&capacity));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityExceeded { set_size: 30, .. })
        ));
    }

    #[test]
    fn narrow_viewport_rejects_what_it_cannot_place() {
        let mut config = ExperimentConfig::default();
        config.display.width = 374.0;
        config.display.height = 1366.0;
        config.set_sizes = vec![2, 18];
        assert!(config.placement_capacity() <= 12);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityExceeded { set_size: 18, .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "set_sizes": [2, 6], "block_size": 8 }"#).unwrap();
        assert_eq!(config.set_sizes, vec![2, 6]);
        assert_eq!(config.block_size, 8);
        assert_eq!(config.durations_ms, vec![200, 400, 600]);
        assert_eq!(config.keys.target_present, "f");
    }

    #[test]
    fn placement_kind_uses_snake_case() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "display": { "placement": "grid" } }"#).unwrap();
        assert_eq!(config.display.placement, PlacementStrategyKind::Grid);
        assert_eq!(config.display.grid_rows, 5);
    }
}
