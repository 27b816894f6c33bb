//! Positions for a search display.
//!
//! Two strategies share the [`PlacementStrategy`] seam. Rejection sampling
//! scatters stimuli freely and may return fewer positions than asked for
//! when the region is crowded; the grid never overlaps but quantizes
//! positions to cell centers and is capped at `rows × cols`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;
use vsearch_core::Placement;

use crate::config::{ExperimentConfig, PlacementStrategyKind};
use crate::random::shuffle;

pub trait PlacementStrategy {
    fn place<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Placement>;

    /// How many placements the strategy can always deliver.
    fn capacity(&self) -> usize;
}

/// Part of the viewport stimuli may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsableRegion {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl UsableRegion {
    /// Viewport inset by `margin_fraction` of its size on every side.
    pub fn inset(width: f32, height: f32, margin_fraction: f32) -> Self {
        Self {
            left: width * margin_fraction,
            top: height * margin_fraction,
            width: width * (1.0 - 2.0 * margin_fraction),
            height: height * (1.0 - 2.0 * margin_fraction),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectionSampler {
    pub region: UsableRegion,
    /// Side of the square every stimulus is assumed to fill.
    pub footprint: f32,
    pub padding: f32,
    /// Attempts for the whole set, not per stimulus.
    pub max_attempts: usize,
}

/// Seeded dry runs that must all reach the capacity.
const CAPACITY_RUNS: u64 = 8;

/// Widening of the lattice spacing so every free lattice cell keeps some
/// room around it instead of a sliver.
const LATTICE_SLACK: f32 = 1.1;

impl RejectionSampler {
    /// Minimum center distance, per axis, between two stimuli.
    fn gap(&self) -> f32 {
        self.footprint + self.padding
    }

    /// Span of the centers along each axis.
    fn spans(&self) -> (f32, f32) {
        (
            (self.region.width - self.footprint).max(0.0),
            (self.region.height - self.footprint).max(0.0),
        )
    }

    fn clear_of(&self, placed: &[Placement], x: f32, y: f32) -> bool {
        let gap = self.gap();
        placed
            .iter()
            .all(|p| (p.x - x).abs() >= gap || (p.y - y).abs() >= gap)
    }

    fn fill<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> (Vec<Placement>, usize) {
        let half = self.footprint / 2.0;
        let (span_x, span_y) = self.spans();

        let mut placed: Vec<Placement> = Vec::with_capacity(n);
        let mut attempts = 0;
        while placed.len() < n && attempts < self.max_attempts {
            attempts += 1;
            let x = self.region.left + half + rng.random::<f32>() * span_x;
            let y = self.region.top + half + rng.random::<f32>() * span_y;
            if self.clear_of(&placed, x, y) {
                placed.push(Placement { x, y });
            }
        }
        (placed, attempts)
    }

    /// Lattice points spaced more than two gaps apart can never be blocked
    /// by the same stimulus, so every arrangement that leaves no room holds
    /// at least one stimulus per lattice point.
    pub fn lattice_bound(&self) -> usize {
        let gap = self.gap();
        if gap <= 0.0 {
            return 0;
        }
        let spacing = 2.0 * gap * LATTICE_SLACK;
        let (span_x, span_y) = self.spans();
        let across = (span_x / spacing).floor() as usize + 1;
        let down = (span_y / spacing).floor() as usize + 1;
        across * down
    }
}

impl PlacementStrategy for RejectionSampler {
    fn place<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Placement> {
        let (placed, attempts) = self.fill(n, rng);
        if placed.len() < n {
            warn!(
                requested = n,
                placed = placed.len(),
                attempts,
                "placement budget exhausted"
            );
        }
        placed
    }

    /// The lattice bound, lowered to what every seeded dry run actually
    /// placed within the attempt budget.
    fn capacity(&self) -> usize {
        let bound = self.lattice_bound();
        (0..CAPACITY_RUNS)
            .map(|seed| self.fill(bound, &mut StdRng::seed_from_u64(seed)).0.len())
            .min()
            .unwrap_or(bound)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub region: UsableRegion,
    pub rows: usize,
    pub cols: usize,
}

impl GridLayout {
    pub fn cell_center(&self, cell: usize) -> Placement {
        let cell_w = self.region.width / self.cols as f32;
        let cell_h = self.region.height / self.rows as f32;
        let (row, col) = (cell / self.cols, cell % self.cols);
        Placement {
            x: self.region.left + (col as f32 + 0.5) * cell_w,
            y: self.region.top + (row as f32 + 0.5) * cell_h,
        }
    }
}

impl PlacementStrategy for GridLayout {
    fn place<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Placement> {
        let mut cells: Vec<usize> = (0..self.capacity()).collect();
        shuffle(&mut cells, rng);
        if n > cells.len() {
            warn!(requested = n, cells = cells.len(), "grid has too few cells");
        }
        cells
            .into_iter()
            .take(n)
            .map(|cell| self.cell_center(cell))
            .collect()
    }

    fn capacity(&self) -> usize {
        self.rows * self.cols
    }
}

/// The configured strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Rejection(RejectionSampler),
    Grid(GridLayout),
}

impl Layout {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        let display = &config.display;
        let region = UsableRegion::inset(display.width, display.height, display.margin_fraction);
        match display.placement {
            PlacementStrategyKind::RejectionSampling => Layout::Rejection(RejectionSampler {
                region,
                footprint: config.stimulus.long_edge,
                padding: display.padding,
                max_attempts: display.max_attempts,
            }),
            PlacementStrategyKind::Grid => Layout::Grid(GridLayout {
                region,
                rows: display.grid_rows,
                cols: display.grid_cols,
            }),
        }
    }
}

impl PlacementStrategy for Layout {
    fn place<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Placement> {
        match self {
            Layout::Rejection(s) => s.place(n, rng),
            Layout::Grid(g) => g.place(n, rng),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Layout::Rejection(s) => s.capacity(),
            Layout::Grid(g) => g.capacity(),
        }
    }
}
