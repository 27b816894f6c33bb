pub mod phase;
pub mod stimulus;
pub mod trial;

pub use phase::{SessionPhase, TrialPhase};
pub use stimulus::{Orientation, PlacedStimulus, Placement, StimulusColor, StimulusDescriptor};
pub use trial::{ResponseKey, ResultRecord, TrialSpec, TrialState};
