use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use vsearch_core::{Orientation, StimulusColor, TrialPhase};
use vsearch_experiment::{
    ConditionGenerator, GridLayout, PlacementStrategy, StimulusComposer, UsableRegion,
};

proptest! {
    #[test]
    fn generated_cells_are_balanced_and_complete(
        sizes in proptest::collection::btree_set(1u32..40, 1..6),
        durations in proptest::collection::btree_set(50u64..1000, 1..4),
        half_reps in 1u32..6,
        seed in any::<u64>(),
    ) {
        let reps = half_reps * 2;
        let generator = ConditionGenerator::new(
            sizes.iter().copied().collect(),
            durations.iter().copied().collect(),
            10,
        );
        let mut rng = StdRng::seed_from_u64(seed);
        for phase in [TrialPhase::Practice, TrialPhase::Main] {
            let trials = generator.generate(reps, phase, &mut rng).unwrap();
            prop_assert_eq!(trials.len(), sizes.len() * durations.len() * reps as usize);

            let mut cells: HashMap<(u32, u64), (u32, u32)> = HashMap::new();
            for t in &trials {
                let cell = cells.entry((t.set_size, t.duration_ms)).or_default();
                if t.target_present { cell.0 += 1 } else { cell.1 += 1 }
            }
            prop_assert_eq!(cells.len(), sizes.len() * durations.len());
            for counts in cells.values() {
                prop_assert_eq!(*counts, (half_reps, half_reps));
            }
        }
    }

    #[test]
    fn main_blocks_are_contiguous_runs(
        sizes in proptest::collection::btree_set(1u32..40, 1..6),
        durations in proptest::collection::btree_set(50u64..1000, 1..4),
        block_size in 1u32..50,
        half_reps in 1u32..5,
        seed in any::<u64>(),
    ) {
        let generator = ConditionGenerator::new(
            sizes.into_iter().collect(),
            durations.into_iter().collect(),
            block_size,
        );
        let trials = generator
            .generate(half_reps * 2, TrialPhase::Main, &mut StdRng::seed_from_u64(seed))
            .unwrap();

        let mut runs: HashMap<u32, usize> = HashMap::new();
        for (pos, t) in trials.iter().enumerate() {
            prop_assert_eq!(t.index, Some(pos as u32 + 1));
            prop_assert_eq!(t.block, Some(pos as u32 / block_size + 1));
            *runs.entry(t.block.unwrap()).or_default() += 1;
        }
        let last = trials.last().and_then(|t| t.block).unwrap();
        for (block, len) in runs {
            if block < last {
                prop_assert_eq!(len, block_size as usize);
            } else {
                prop_assert!(len <= block_size as usize);
            }
        }
    }

    #[test]
    fn composed_sets_have_exact_size_and_one_target(
        set_size in 1u32..60,
        target_present in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let composer = StimulusComposer::new(Orientation::Vertical);
        let stimuli = composer.compose(set_size, target_present, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(stimuli.len(), set_size as usize);

        let targets = stimuli.iter().filter(|s| s.is_target).count();
        let target_pairs = stimuli
            .iter()
            .filter(|s| s.color == StimulusColor::Target && s.orientation == Orientation::Vertical)
            .count();
        prop_assert_eq!(targets, target_present as usize);
        prop_assert_eq!(target_pairs, target_present as usize);

        let vertical = stimuli
            .iter()
            .filter(|s| s.color == StimulusColor::Distractor && s.orientation == Orientation::Vertical)
            .count() as i64;
        let horizontal = stimuli
            .iter()
            .filter(|s| s.color == StimulusColor::Distractor && s.orientation == Orientation::Horizontal)
            .count() as i64;
        prop_assert!(horizontal - vertical == 0 || horizontal - vertical == 1);
    }

    #[test]
    fn grid_placements_use_distinct_cells(
        rows in 1usize..8,
        cols in 1usize..8,
        fill in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let grid = GridLayout {
            region: UsableRegion::inset(1920.0, 1080.0, 0.1),
            rows,
            cols,
        };
        let n = ((rows * cols) as f64 * fill).floor() as usize;
        let placed = grid.place(n, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(placed.len(), n);
        let distinct: HashSet<(u32, u32)> =
            placed.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect();
        prop_assert_eq!(distinct.len(), n);
    }
}
