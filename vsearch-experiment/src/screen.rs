use vsearch_core::PlacedStimulus;

/// What the presentation layer should show next. Emitted by the session;
/// the core never waits on the renderer, only on its own timer.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Instructions { page: usize, text: String },
    Fixation,
    Stimuli {
        items: Vec<PlacedStimulus>,
        duration_ms: u64,
    },
    DecisionPrompt { deadline_ms: u64 },
    Ready { text: String },
    Rest { next_block: u32, text: String },
    End { text: String, hold_ms: u64 },
}

/// Seam to the external renderer.
pub trait Presenter {
    fn present(&mut self, screen: &Screen);
}
