pub mod compose;
pub mod conditions;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod layout;
pub mod random;
pub mod screen;
pub mod session;
pub mod summary;
pub mod trial;

pub use compose::StimulusComposer;
pub use conditions::{ConditionGenerator, assign_blocks};
pub use config::{ExperimentConfig, PlacementStrategyKind};
pub use error::{ConfigError, ExperimentError, Result};
pub use input::{InputMap, KeyAction};
pub use layout::{GridLayout, Layout, PlacementStrategy, RejectionSampler, UsableRegion};
pub use screen::{Presenter, Screen};
pub use session::{Session, SessionEvent};
pub use summary::{Summary, summarize};
pub use trial::{Trial, TrialEngine, TrialEvent, TrialOutcome, TrialSignal};
