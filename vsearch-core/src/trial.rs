use crate::phase::TrialPhase;
use serde::{Deserialize, Serialize};

/// States of a single trial, `Idle` through `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    Idle,
    Fixation,
    Stimulus,
    Decision,
    Responded,
    TimedOut,
    Done,
}

impl TrialState {
    pub fn is_done(&self) -> bool {
        matches!(self, TrialState::Done)
    }
}

/// One of the two decision answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKey {
    Present,
    Absent,
}

impl ResponseKey {
    /// The answer that is correct for a trial.
    pub fn expected(target_present: bool) -> Self {
        if target_present {
            ResponseKey::Present
        } else {
            ResponseKey::Absent
        }
    }
}

/// Condition of one trial. Fixed once generated; `block` and `index` are
/// only set for the main phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub phase: TrialPhase,
    pub set_size: u32,
    pub duration_ms: u64,
    pub target_present: bool,
    pub block: Option<u32>,
    pub index: Option<u32>,
}

impl TrialSpec {
    pub fn new(phase: TrialPhase, set_size: u32, duration_ms: u64, target_present: bool) -> Self {
        Self {
            phase,
            set_size,
            duration_ms,
            target_present,
            block: None,
            index: None,
        }
    }
}

/// Exported row for one finished main-phase trial. Field order is the
/// column order of the export table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub trial_index: u32,
    pub block: u32,
    pub set_size: u32,
    pub display_duration: u64,
    pub target_present: u8,
    pub response_key: String,
    pub correct: u8,
    pub rt_ms: u64,
}

impl ResultRecord {
    pub fn timed_out(&self) -> bool {
        self.response_key.is_empty()
    }

    pub fn is_correct(&self) -> bool {
        self.correct == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_key_follows_target_presence() {
        assert_eq!(ResponseKey::expected(true), ResponseKey::Present);
        assert_eq!(ResponseKey::expected(false), ResponseKey::Absent);
    }

    #[test]
    fn new_spec_is_untagged() {
        let spec = TrialSpec::new(TrialPhase::Practice, 6, 400, true);
        assert_eq!(spec.block, None);
        assert_eq!(spec.index, None);
    }

    #[test]
    fn empty_response_key_means_timeout() {
        let record = ResultRecord {
            trial_index: 1,
            block: 1,
            set_size: 2,
            display_duration: 200,
            target_present: 1,
            response_key: String::new(),
            correct: 0,
            rt_ms: 3000,
        };
        assert!(record.timed_out());
        assert!(!record.is_correct());
    }
}
