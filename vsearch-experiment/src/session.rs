use rand::Rng;
use tracing::{debug, info, trace};
use vsearch_core::{ResultRecord, SessionPhase, TrialPhase, TrialSpec};
use vsearch_timing::Timer;

use crate::conditions::ConditionGenerator;
use crate::config::ExperimentConfig;
use crate::error::ConfigError;
use crate::input::KeyAction;
use crate::screen::Screen;
use crate::trial::{Trial, TrialEngine, TrialEvent, TrialOutcome, TrialSignal, ms_to_ns};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Show(Screen),
    PhaseChanged(SessionPhase),
    BlockStarted(u32),
    TrialCompleted(TrialOutcome),
    Finished,
}

/// Drives instructions, practice, the blocked main phase and the end screen.
///
/// The driver loop calls [`Session::update`] to let timers elapse and
/// [`Session::handle_key`] for key presses. Exactly one trial is live at a
/// time and the session is the only writer of the results buffer.
pub struct Session<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ExperimentConfig,
    timer: T,
    rng: R,
    engine: TrialEngine,
    phase: SessionPhase,
    practice: Vec<TrialSpec>,
    main: Vec<TrialSpec>,
    cursor: usize,
    current: Option<Trial>,
    current_block: u32,
    end_started: Option<u64>,
    results: Vec<ResultRecord>,
}

impl<T, R> Session<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    /// Validates the configuration and generates both trial sequences.
    pub fn new(config: ExperimentConfig, timer: T, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = TrialEngine::from_config(&config)?;
        let generator = ConditionGenerator::from_config(&config);
        let practice = generator.generate_phase(&config, TrialPhase::Practice, &mut rng)?;
        let main = generator.generate_phase(&config, TrialPhase::Main, &mut rng)?;

        info!(
            practice = practice.len(),
            main = main.len(),
            blocks = config.block_count(),
            placement = config.display.placement.name(),
            "session prepared"
        );

        Ok(Self {
            results: Vec::with_capacity(main.len()),
            config,
            timer,
            rng,
            engine,
            phase: SessionPhase::Idle,
            practice,
            main,
            cursor: 0,
            current: None,
            current_block: 0,
            end_started: None,
        })
    }

    /// Shows the first instruction page. Does nothing once started.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase == SessionPhase::Idle {
            self.show_instructions(0, &mut events);
        }
        events
    }

    /// Lets pending timers elapse against the current clock reading.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            phase if phase.runs_trials() => self.drive_trial(TrialEvent::Tick, &mut events),
            SessionPhase::End => {
                let hold_ns = ms_to_ns(self.config.end_screen_ms);
                let now = self.timer.now();
                if self
                    .end_started
                    .is_some_and(|start| now.saturating_sub(start) >= hold_ns)
                {
                    self.set_phase(SessionPhase::Finished, &mut events);
                    events.push(SessionEvent::Finished);
                    info!(records = self.results.len(), "session finished");
                }
            }
            _ => {}
        }
        events
    }

    pub fn handle_key(&mut self, raw: &str) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.engine.input.classify(raw) {
            KeyAction::Advance if self.phase.accepts_advance() => self.advance(&mut events),
            KeyAction::Respond(key) if self.phase.runs_trials() => {
                self.drive_trial(TrialEvent::Response(key), &mut events)
            }
            action => trace!(?action, phase = ?self.phase, raw, "key ignored"),
        }
        events
    }

    fn advance(&mut self, events: &mut Vec<SessionEvent>) {
        match self.phase {
            SessionPhase::Instructions(page) => self.show_instructions(page + 1, events),
            SessionPhase::Ready => {
                self.cursor = 0;
                self.set_phase(SessionPhase::Main, events);
                self.start_next_trial(events);
            }
            SessionPhase::Rest => {
                let next = self
                    .main
                    .get(self.cursor)
                    .and_then(|spec| spec.block)
                    .unwrap_or(self.current_block + 1);
                self.set_phase(SessionPhase::Main, events);
                self.begin_block(next, events);
                self.start_next_trial(events);
            }
            _ => {}
        }
    }

    fn show_instructions(&mut self, page: usize, events: &mut Vec<SessionEvent>) {
        match self.config.text.instructions.get(page).cloned() {
            Some(text) => {
                self.set_phase(SessionPhase::Instructions(page), events);
                events.push(SessionEvent::Show(Screen::Instructions { page, text }));
            }
            None => {
                self.cursor = 0;
                self.set_phase(SessionPhase::Practice, events);
                self.start_next_trial(events);
            }
        }
    }

    fn drive_trial(&mut self, event: TrialEvent, events: &mut Vec<SessionEvent>) {
        let now = self.timer.now();
        let Some(trial) = self.current.as_mut() else {
            return;
        };
        match trial.handle(event, now, &self.engine, &mut self.rng) {
            Some(TrialSignal::Show(screen)) => events.push(SessionEvent::Show(screen)),
            Some(TrialSignal::Completed(outcome)) => self.complete_trial(outcome, events),
            None => {}
        }
    }

    fn complete_trial(&mut self, outcome: TrialOutcome, events: &mut Vec<SessionEvent>) {
        debug!(
            phase = %outcome.spec.phase,
            index = ?outcome.spec.index,
            key = %outcome.response_key,
            correct = outcome.correct,
            rt_ms = outcome.rt_ms,
            "trial complete"
        );
        if let Some(record) = outcome.to_record() {
            self.results.push(record);
        }
        events.push(SessionEvent::TrialCompleted(outcome));
        self.current = None;
        self.cursor += 1;
        self.start_next_trial(events);
    }

    fn start_next_trial(&mut self, events: &mut Vec<SessionEvent>) {
        match self.phase {
            SessionPhase::Practice => match self.practice.get(self.cursor).cloned() {
                Some(spec) => self.launch(spec, events),
                None => {
                    self.set_phase(SessionPhase::Ready, events);
                    let text = self.config.text.ready.clone();
                    events.push(SessionEvent::Show(Screen::Ready { text }));
                }
            },
            SessionPhase::Main => {
                let Some(spec) = self.main.get(self.cursor).cloned() else {
                    self.enter_end(events);
                    return;
                };
                let block = spec.block.unwrap_or(1);
                if block != self.current_block {
                    if self.current_block == 0 {
                        self.begin_block(block, events);
                    } else {
                        self.set_phase(SessionPhase::Rest, events);
                        let text = self.config.text.rest.clone();
                        events.push(SessionEvent::Show(Screen::Rest {
                            next_block: block,
                            text,
                        }));
                        return;
                    }
                }
                self.launch(spec, events);
            }
            _ => {}
        }
    }

    fn launch(&mut self, spec: TrialSpec, events: &mut Vec<SessionEvent>) {
        let now = self.timer.now();
        let mut trial = Trial::new(spec);
        if let Some(TrialSignal::Show(screen)) =
            trial.handle(TrialEvent::Begin, now, &self.engine, &mut self.rng)
        {
            events.push(SessionEvent::Show(screen));
        }
        self.current = Some(trial);
    }

    fn begin_block(&mut self, block: u32, events: &mut Vec<SessionEvent>) {
        self.current_block = block;
        info!(block, of = self.config.block_count(), "block started");
        events.push(SessionEvent::BlockStarted(block));
    }

    fn enter_end(&mut self, events: &mut Vec<SessionEvent>) {
        self.end_started = Some(self.timer.now());
        self.set_phase(SessionPhase::End, events);
        events.push(SessionEvent::Show(Screen::End {
            text: self.config.text.end.clone(),
            hold_ms: self.config.end_screen_ms,
        }));
    }

    fn set_phase(&mut self, phase: SessionPhase, events: &mut Vec<SessionEvent>) {
        info!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
        events.push(SessionEvent::PhaseChanged(phase));
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    pub fn practice_trials(&self) -> &[TrialSpec] {
        &self.practice
    }

    pub fn main_trials(&self) -> &[TrialSpec] {
        &self.main
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.current.as_ref()
    }

    pub fn current_block(&self) -> u32 {
        self.current_block
    }

    /// 1-based number of the live trial and the size of its phase.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.phase {
            SessionPhase::Practice => Some((self.cursor + 1, self.practice.len())),
            SessionPhase::Main => Some((self.cursor + 1, self.main.len())),
            _ => None,
        }
    }

    /// Main-phase records in completion order.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ResultRecord> {
        self.results
    }
}
