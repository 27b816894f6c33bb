use clap::Args;
use rand::Rng;
use rand::rngs::StdRng;
use vsearch_experiment::config::KeyConfig;
use vsearch_experiment::random::int_in_range;
use vsearch_experiment::Screen;

const NS_PER_MS: u64 = 1_000_000;

#[derive(Args, Debug, Clone)]
pub struct ParticipantArgs {
    /// Probability of answering a decision prompt correctly
    #[arg(long, default_value_t = 0.9)]
    pub accuracy: f64,
    /// Probability of letting a decision prompt time out
    #[arg(long, default_value_t = 0.02)]
    pub lapse_rate: f64,
    #[arg(long, default_value_t = 350)]
    pub rt_min: u64,
    #[arg(long, default_value_t = 1200)]
    pub rt_max: u64,
    /// Time spent on each text screen before pressing the advance key
    #[arg(long, default_value_t = 800)]
    pub read_ms: u64,
}

/// Scripted stand-in for a person at the keyboard.
pub struct SimulatedParticipant {
    args: ParticipantArgs,
    keys: KeyConfig,
    rng: StdRng,
    saw_target: bool,
    pending: Option<(u64, String)>,
}

impl SimulatedParticipant {
    pub fn new(args: ParticipantArgs, keys: KeyConfig, rng: StdRng) -> Self {
        Self {
            args,
            keys,
            rng,
            saw_target: false,
            pending: None,
        }
    }

    pub fn observe(&mut self, screen: &Screen, now_ns: u64) {
        match screen {
            Screen::Instructions { .. } | Screen::Ready { .. } | Screen::Rest { .. } => {
                let due = now_ns + self.args.read_ms * NS_PER_MS;
                self.pending = Some((due, self.keys.advance.clone()));
            }
            Screen::Stimuli { items, .. } => {
                self.saw_target = items.iter().any(|s| s.is_target);
            }
            Screen::DecisionPrompt { .. } => {
                self.pending = self.answer(now_ns);
            }
            Screen::Fixation | Screen::End { .. } => self.pending = None,
        }
    }

    fn answer(&mut self, now_ns: u64) -> Option<(u64, String)> {
        if self.rng.random_bool(self.args.lapse_rate.clamp(0.0, 1.0)) {
            return None;
        }
        let correct = self.rng.random_bool(self.args.accuracy.clamp(0.0, 1.0));
        let key = if self.saw_target == correct {
            &self.keys.target_present
        } else {
            &self.keys.target_absent
        };
        let rt_ms = int_in_range(&mut self.rng, self.args.rt_min, self.args.rt_max);
        Some((now_ns + rt_ms * NS_PER_MS, key.clone()))
    }

    /// The key due at `now_ns`, if any.
    pub fn poll(&mut self, now_ns: u64) -> Option<String> {
        match &self.pending {
            Some((due, _)) if *due <= now_ns => self.pending.take().map(|(_, key)| key),
            _ => None,
        }
    }
}
