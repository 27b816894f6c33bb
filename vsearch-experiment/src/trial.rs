use rand::Rng;
use tracing::{debug, trace};
use vsearch_core::{
    PlacedStimulus, ResponseKey, ResultRecord, StimulusColor, TrialSpec, TrialState,
};

use crate::compose::StimulusComposer;
use crate::config::{ExperimentConfig, StimulusConfig};
use crate::error::ConfigError;
use crate::input::InputMap;
use crate::layout::{Layout, PlacementStrategy};
use crate::random::int_in_range;
use crate::screen::Screen;

const NS_PER_MS: u64 = 1_000_000;

/// Everything a trial needs besides its own spec and clock readings. Owned
/// by the session and lent to the live trial on every transition.
#[derive(Debug, Clone)]
pub struct TrialEngine {
    pub composer: StimulusComposer,
    pub layout: Layout,
    pub input: InputMap,
    pub stimulus: StimulusConfig,
    pub fixation_range_ms: (u64, u64),
    pub deadline_ms: u64,
}

impl TrialEngine {
    pub fn from_config(config: &ExperimentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            composer: StimulusComposer::new(config.stimulus.target_orientation),
            layout: Layout::from_config(config),
            input: InputMap::from_config(&config.keys)?,
            stimulus: config.stimulus.clone(),
            fixation_range_ms: config.fixation_range_ms,
            deadline_ms: config.decision_deadline_ms,
        })
    }

    fn rgba(&self, color: StimulusColor) -> [u8; 4] {
        match color {
            StimulusColor::Target => self.stimulus.target_color,
            StimulusColor::Distractor => self.stimulus.distractor_color,
        }
    }

    /// Fresh descriptors paired with fresh positions. Descriptor `i` takes
    /// placement `i`; a short placement list drops surplus distractors,
    /// never the target.
    pub fn materialize<R: Rng + ?Sized>(&self, spec: &TrialSpec, rng: &mut R) -> Vec<PlacedStimulus> {
        let mut descriptors = self.composer.compose(spec.set_size, spec.target_present, rng);
        let placements = self.layout.place(descriptors.len(), rng);
        if placements.len() < descriptors.len() {
            if let Some(target) = descriptors.iter().position(|d| d.is_target) {
                descriptors.swap(0, target);
            }
        }
        descriptors
            .into_iter()
            .zip(placements)
            .map(|(d, p)| {
                PlacedStimulus::new(
                    d,
                    p,
                    self.stimulus.long_edge,
                    self.stimulus.short_edge,
                    self.rgba(d.color),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialEvent {
    Begin,
    Tick,
    Response(ResponseKey),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialSignal {
    Show(Screen),
    Completed(TrialOutcome),
}

/// How a trial's decision phase concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialOutcome {
    pub spec: TrialSpec,
    pub response: Option<ResponseKey>,
    /// Recorded key name, empty on timeout.
    pub response_key: String,
    pub correct: bool,
    pub rt_ms: u64,
}

impl TrialOutcome {
    pub fn timed_out(&self) -> bool {
        self.response.is_none()
    }

    /// Export row; `None` for practice trials.
    pub fn to_record(&self) -> Option<ResultRecord> {
        if !self.spec.phase.is_main() {
            return None;
        }
        Some(ResultRecord {
            trial_index: self.spec.index?,
            block: self.spec.block?,
            set_size: self.spec.set_size,
            display_duration: self.spec.duration_ms,
            target_present: self.spec.target_present as u8,
            response_key: self.response_key.clone(),
            correct: self.correct as u8,
            rt_ms: self.rt_ms,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrialDurations {
    pub fixation_ms: u64,
    pub stimulus_ms: u64,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TrialTimestamps {
    pub fixation_start: Option<u64>,
    pub stimulus_start: Option<u64>,
    pub decision_start: Option<u64>,
    pub response: Option<u64>,
}

/// Armed on entering `Decision`. Whichever completion path takes it first
/// finishes the trial; the other finds nothing to take.
#[derive(Debug, Clone, Copy)]
struct DecisionWindow {
    deadline_ns: u64,
}

impl DecisionWindow {
    fn expired(&self, now_ns: u64) -> bool {
        now_ns >= self.deadline_ns
    }
}

/// One fixation → stimulus → decision cycle.
#[derive(Debug, Clone)]
pub struct Trial {
    pub spec: TrialSpec,
    pub durations: TrialDurations,
    pub timestamps: TrialTimestamps,
    pub state: TrialState,
    window: Option<DecisionWindow>,
}

impl Trial {
    pub fn new(spec: TrialSpec) -> Self {
        let durations = TrialDurations {
            stimulus_ms: spec.duration_ms,
            ..Default::default()
        };
        Self {
            spec,
            durations,
            timestamps: TrialTimestamps::default(),
            state: TrialState::Idle,
            window: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// The single transition function. `now_ns` is the driver's clock
    /// reading for this event.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        event: TrialEvent,
        now_ns: u64,
        engine: &TrialEngine,
        rng: &mut R,
    ) -> Option<TrialSignal> {
        match (self.state, event) {
            (TrialState::Idle, TrialEvent::Begin) => {
                let (min, max) = engine.fixation_range_ms;
                self.durations.fixation_ms = int_in_range(rng, min, max);
                self.durations.deadline_ms = engine.deadline_ms;
                self.timestamps.fixation_start = Some(now_ns);
                self.enter(TrialState::Fixation);
                Some(TrialSignal::Show(Screen::Fixation))
            }
            (TrialState::Fixation, TrialEvent::Tick)
                if elapsed_at_least(self.timestamps.fixation_start, now_ns, self.durations.fixation_ms) =>
            {
                let items = engine.materialize(&self.spec, rng);
                self.timestamps.stimulus_start = Some(now_ns);
                self.enter(TrialState::Stimulus);
                Some(TrialSignal::Show(Screen::Stimuli {
                    items,
                    duration_ms: self.durations.stimulus_ms,
                }))
            }
            (TrialState::Stimulus, TrialEvent::Tick)
                if elapsed_at_least(self.timestamps.stimulus_start, now_ns, self.durations.stimulus_ms) =>
            {
                self.window = Some(DecisionWindow {
                    deadline_ns: now_ns.saturating_add(ms_to_ns(self.durations.deadline_ms)),
                });
                self.timestamps.decision_start = Some(now_ns);
                self.enter(TrialState::Decision);
                Some(TrialSignal::Show(Screen::DecisionPrompt {
                    deadline_ms: self.durations.deadline_ms,
                }))
            }
            (TrialState::Decision, TrialEvent::Tick) => {
                if self.window.is_some_and(|w| w.expired(now_ns)) {
                    self.close(None, now_ns, engine)
                } else {
                    None
                }
            }
            (TrialState::Decision, TrialEvent::Response(key)) => {
                // A key that lands on or after the deadline loses to it.
                let accepted = match self.window {
                    Some(w) if w.expired(now_ns) => None,
                    _ => Some(key),
                };
                self.close(accepted, now_ns, engine)
            }
            (state, TrialEvent::Response(key)) => {
                trace!(?state, ?key, "response outside decision window ignored");
                None
            }
            _ => None,
        }
    }

    fn close(
        &mut self,
        response: Option<ResponseKey>,
        now_ns: u64,
        engine: &TrialEngine,
    ) -> Option<TrialSignal> {
        self.window.take()?;

        let rt_ms = match response {
            Some(_) => {
                self.timestamps.response = Some(now_ns);
                self.enter(TrialState::Responded);
                self.response_time_ms().unwrap_or_default()
            }
            None => {
                self.enter(TrialState::TimedOut);
                self.durations.deadline_ms
            }
        };
        let correct = response == Some(ResponseKey::expected(self.spec.target_present));
        let response_key = response
            .map(|k| engine.input.key_name(k).to_string())
            .unwrap_or_default();

        let outcome = TrialOutcome {
            spec: self.spec.clone(),
            response,
            response_key,
            correct,
            rt_ms,
        };
        self.enter(TrialState::Done);
        Some(TrialSignal::Completed(outcome))
    }

    /// Decision onset to accepted key, rounded to whole milliseconds.
    pub fn response_time_ms(&self) -> Option<u64> {
        let opened = self.timestamps.decision_start?;
        let pressed = self.timestamps.response?;
        Some(pressed.saturating_sub(opened).saturating_add(NS_PER_MS / 2) / NS_PER_MS)
    }

    fn enter(&mut self, next: TrialState) {
        debug!(
            trial = ?self.spec.index,
            phase = %self.spec.phase,
            from = ?self.state,
            to = ?next,
            "trial transition"
        );
        self.state = next;
    }
}

pub(crate) fn ms_to_ns(ms: u64) -> u64 {
    ms.saturating_mul(NS_PER_MS)
}

fn elapsed_at_least(start: Option<u64>, now_ns: u64, ms: u64) -> bool {
    start.is_some_and(|s| now_ns.saturating_sub(s) >= ms_to_ns(ms))
}
