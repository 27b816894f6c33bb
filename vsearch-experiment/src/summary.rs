//! Accuracy and reaction-time summaries of a finished record set.

use std::collections::BTreeMap;

use vsearch_core::ResultRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSummary {
    pub trials: usize,
    pub correct: usize,
    pub timeouts: usize,
    correct_rt_total: u64,
}

impl CellSummary {
    fn add(&mut self, record: &ResultRecord) {
        self.trials += 1;
        if record.timed_out() {
            self.timeouts += 1;
        }
        if record.is_correct() {
            self.correct += 1;
            self.correct_rt_total += record.rt_ms;
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.correct as f64 / self.trials as f64
        }
    }

    /// Mean RT over correct trials only.
    pub fn mean_correct_rt_ms(&self) -> Option<f64> {
        (self.correct > 0).then(|| self.correct_rt_total as f64 / self.correct as f64)
    }
}

/// Key of a summary cell: set size, display duration, target present.
pub type CellKey = (u32, u64, bool);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub overall: CellSummary,
    pub cells: BTreeMap<CellKey, CellSummary>,
    pub min_rt_ms: Option<u64>,
    pub max_rt_ms: Option<u64>,
}

impl Summary {
    pub fn response_rate(&self) -> f64 {
        if self.overall.trials == 0 {
            0.0
        } else {
            1.0 - self.overall.timeouts as f64 / self.overall.trials as f64
        }
    }
}

pub fn summarize(records: &[ResultRecord]) -> Summary {
    let mut summary = Summary::default();
    for record in records {
        summary.overall.add(record);
        summary
            .cells
            .entry((record.set_size, record.display_duration, record.target_present == 1))
            .or_default()
            .add(record);
        if !record.timed_out() {
            summary.min_rt_ms = Some(summary.min_rt_ms.map_or(record.rt_ms, |m| m.min(record.rt_ms)));
            summary.max_rt_ms = Some(summary.max_rt_ms.map_or(record.rt_ms, |m| m.max(record.rt_ms)));
        }
    }
    summary
}
