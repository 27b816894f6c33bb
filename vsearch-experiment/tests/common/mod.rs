// Shared session harness; included by the integration test files.
#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use vsearch_core::{ResultRecord, TrialSpec};
use vsearch_experiment::{ExperimentConfig, Screen, Session, SessionEvent};
use vsearch_timing::{ManualClock, Timer};

pub const MS: u64 = 1_000_000;
const STEP_LIMIT: usize = 2_000_000;

/// Two set sizes × two durations × 4 reps = 16 main trials in blocks of 8.
pub fn small_config() -> ExperimentConfig {
    ExperimentConfig {
        set_sizes: vec![2, 6],
        durations_ms: vec![200, 400],
        practice_reps_per_condition: 2,
        main_reps_per_condition: 4,
        block_size: 8,
        end_screen_ms: 500,
        ..Default::default()
    }
}

pub struct Harness {
    pub clock: ManualClock,
    pub session: Session<ManualClock, StdRng>,
    pub log: Vec<SessionEvent>,
    scanned: usize,
    pending: Option<(u64, String)>,
}

impl Harness {
    pub fn new(config: ExperimentConfig, seed: u64) -> Self {
        let clock = ManualClock::new();
        let session = Session::new(config, clock.clone(), StdRng::seed_from_u64(seed))
            .expect("valid config");
        Self {
            clock,
            session,
            log: Vec::new(),
            scanned: 0,
            pending: None,
        }
    }

    /// Steps the session in 1 ms ticks. Text screens are advanced at once;
    /// each decision prompt is answered with whatever `answer` returns
    /// (key and delay in ms), or left to time out on `None`. Stops when
    /// `stop` matches a fresh event or the session finishes.
    pub fn run_until<A, S>(&mut self, mut answer: A, mut stop: S) -> bool
    where
        A: FnMut(&TrialSpec) -> Option<(&'static str, u64)>,
        S: FnMut(&SessionEvent, &Session<ManualClock, StdRng>) -> bool,
    {
        if self.log.is_empty() {
            let events = self.session.start();
            self.log.extend(events);
        }
        for _ in 0..STEP_LIMIT {
            while self.scanned < self.log.len() {
                let event = self.log[self.scanned].clone();
                self.scanned += 1;
                if stop(&event, &self.session) {
                    return true;
                }
                match event {
                    SessionEvent::Finished => return true,
                    SessionEvent::Show(
                        Screen::Instructions { .. } | Screen::Ready { .. } | Screen::Rest { .. },
                    ) => self.pending = Some((self.clock.now(), " ".to_string())),
                    SessionEvent::Show(Screen::DecisionPrompt { .. }) => {
                        let spec = self
                            .session
                            .current_trial()
                            .map(|t| t.spec.clone())
                            .expect("live trial at decision");
                        self.pending = answer(&spec)
                            .map(|(key, delay)| (self.clock.now() + delay * MS, key.to_string()));
                    }
                    _ => {}
                }
            }

            if let Some((due, key)) = self.pending.clone() {
                if self.clock.now() >= due {
                    self.pending = None;
                    let events = self.session.handle_key(&key);
                    self.log.extend(events);
                    continue;
                }
            }
            let events = self.session.update();
            self.log.extend(events);
            if self.scanned == self.log.len() {
                self.clock.advance_ms(1);
            }
        }
        false
    }

    pub fn run_to_end<A>(&mut self, answer: A) -> Vec<ResultRecord>
    where
        A: FnMut(&TrialSpec) -> Option<(&'static str, u64)>,
    {
        assert!(self.run_until(answer, |_, _| false), "session did not finish");
        assert!(self.session.is_finished());
        self.session.results().to_vec()
    }

    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.log.iter().filter(|e| pred(e)).count()
    }
}

/// Always answers correctly after `delay` ms.
pub fn correct_after(delay: u64) -> impl FnMut(&TrialSpec) -> Option<(&'static str, u64)> {
    move |spec| Some((if spec.target_present { "f" } else { "j" }, delay))
}
