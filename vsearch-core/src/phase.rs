use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sequence a trial belongs to. Only main-phase trials are recorded.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialPhase {
    Practice,
    Main,
}

impl TrialPhase {
    pub fn is_main(&self) -> bool {
        matches!(self, TrialPhase::Main)
    }
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialPhase::Practice => f.write_str("practice"),
            TrialPhase::Main => f.write_str("main"),
        }
    }
}

/// Screens of a whole session, in the order they are visited.
///
/// `Rest` sits between main-phase blocks and returns to `Main` on advance.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Instructions(usize),
    Practice,
    Ready,
    Main,
    Rest,
    End,
    Finished,
}

impl SessionPhase {
    /// Screens that wait for the advance key.
    pub fn accepts_advance(&self) -> bool {
        matches!(
            self,
            SessionPhase::Instructions(_) | SessionPhase::Ready | SessionPhase::Rest
        )
    }

    pub fn runs_trials(&self) -> bool {
        self.trial_phase().is_some()
    }

    pub fn trial_phase(&self) -> Option<TrialPhase> {
        match self {
            SessionPhase::Practice => Some(TrialPhase::Practice),
            SessionPhase::Main => Some(TrialPhase::Main),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionPhase::Finished)
    }
}
