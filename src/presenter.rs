use tracing::{debug, info};
use vsearch_experiment::{Presenter, Screen};

/// Stands in for a renderer by logging each screen.
#[derive(Debug, Default)]
pub struct LogPresenter {
    pub shown: usize,
}

impl Presenter for LogPresenter {
    fn present(&mut self, screen: &Screen) {
        self.shown += 1;
        match screen {
            Screen::Instructions { page, .. } => info!(page, "instructions"),
            Screen::Fixation => debug!("fixation"),
            Screen::Stimuli { items, duration_ms } => debug!(
                items = items.len(),
                target = items.iter().any(|s| s.is_target),
                duration_ms,
                "search display"
            ),
            Screen::DecisionPrompt { deadline_ms } => debug!(deadline_ms, "decision prompt"),
            Screen::Ready { .. } => info!("ready for the main phase"),
            Screen::Rest { next_block, .. } => info!(next_block, "rest"),
            Screen::End { hold_ms, .. } => info!(hold_ms, "end screen"),
        }
    }
}
