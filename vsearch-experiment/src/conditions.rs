//! Balanced trial sequences for the practice and main phases.

use rand::Rng;
use tracing::debug;
use vsearch_core::{TrialPhase, TrialSpec};

use crate::config::ExperimentConfig;
use crate::error::ConfigError;
use crate::random::shuffle;

#[derive(Debug, Clone)]
pub struct ConditionGenerator {
    set_sizes: Vec<u32>,
    durations_ms: Vec<u64>,
    block_size: u32,
}

impl ConditionGenerator {
    pub fn new(set_sizes: Vec<u32>, durations_ms: Vec<u64>, block_size: u32) -> Self {
        Self {
            set_sizes,
            durations_ms,
            block_size,
        }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(
            config.set_sizes.clone(),
            config.durations_ms.clone(),
            config.block_size,
        )
    }

    /// Every set size × duration cell, half target-present and half absent,
    /// in one uniformly shuffled order. Main-phase specs come back tagged
    /// with `block` and `index`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        reps_per_condition: u32,
        phase: TrialPhase,
        rng: &mut R,
    ) -> Result<Vec<TrialSpec>, ConfigError> {
        if reps_per_condition == 0 || reps_per_condition % 2 != 0 {
            return Err(ConfigError::InvalidRepetitions {
                phase,
                reps: reps_per_condition,
            });
        }
        if phase.is_main() && self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }

        let half = reps_per_condition / 2;
        let mut trials = Vec::with_capacity(
            self.set_sizes.len() * self.durations_ms.len() * reps_per_condition as usize,
        );
        for &set_size in &self.set_sizes {
            for &duration_ms in &self.durations_ms {
                for target_present in [true, false] {
                    for _ in 0..half {
                        trials.push(TrialSpec::new(phase, set_size, duration_ms, target_present));
                    }
                }
            }
        }
        shuffle(&mut trials, rng);

        if phase.is_main() {
            assign_blocks(&mut trials, self.block_size);
        }
        debug!(%phase, trials = trials.len(), "generated trial sequence");
        Ok(trials)
    }

    /// Generates a phase using the repetitions the configuration names for it.
    pub fn generate_phase<R: Rng + ?Sized>(
        &self,
        config: &ExperimentConfig,
        phase: TrialPhase,
        rng: &mut R,
    ) -> Result<Vec<TrialSpec>, ConfigError> {
        self.generate(config.reps_for(phase), phase, rng)
    }
}

/// Tags a shuffled sequence with its 1-based position and the contiguous
/// block of `block_size` trials that position falls in.
pub fn assign_blocks(trials: &mut [TrialSpec], block_size: u32) {
    let block_size = block_size.max(1) as usize;
    for (i, trial) in trials.iter_mut().enumerate() {
        trial.block = Some((i / block_size) as u32 + 1);
        trial.index = Some(i as u32 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn generator() -> ConditionGenerator {
        ConditionGenerator::new(vec![2, 6], vec![200, 400], 8)
    }

    #[test]
    fn every_cell_is_balanced() {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = generator().generate(6, TrialPhase::Main, &mut rng).unwrap();
        let mut cells: HashMap<(u32, u64), (u32, u32)> = HashMap::new();
        for t in &trials {
            let cell = cells.entry((t.set_size, t.duration_ms)).or_default();
            if t.target_present {
                cell.0 += 1;
            } else {
                cell.1 += 1;
            }
        }
        assert_eq!(cells.len(), 4);
        for counts in cells.values() {
            assert_eq!(*counts, (3, 3));
        }
    }

    #[test]
    fn sixteen_trials_split_into_two_blocks() {
        let mut rng = StdRng::seed_from_u64(5);
        let trials = generator().generate(4, TrialPhase::Main, &mut rng).unwrap();
        assert_eq!(trials.len(), 16);
        for (pos, t) in trials.iter().enumerate() {
            assert_eq!(t.index, Some(pos as u32 + 1));
            assert_eq!(t.block, Some(if pos < 8 { 1 } else { 2 }));
        }
    }

    #[test]
    fn practice_trials_carry_no_block() {
        let mut rng = StdRng::seed_from_u64(5);
        let trials = generator()
            .generate(2, TrialPhase::Practice, &mut rng)
            .unwrap();
        assert_eq!(trials.len(), 8);
        assert!(trials.iter().all(|t| t.block.is_none() && t.index.is_none()));
        assert!(trials.iter().all(|t| t.phase == TrialPhase::Practice));
    }

    #[test]
    fn odd_repetitions_are_refused() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            generator().generate(3, TrialPhase::Practice, &mut rng),
            Err(ConfigError::InvalidRepetitions {
                phase: TrialPhase::Practice,
                reps: 3
            })
        );
    }

    #[test]
    fn last_block_may_be_short() {
        let mut trials: Vec<TrialSpec> = (0..10)
            .map(|_| TrialSpec::new(TrialPhase::Main, 2, 200, true))
            .collect();
        assign_blocks(&mut trials, 4);
        let blocks: Vec<u32> = trials.iter().filter_map(|t| t.block).collect();
        assert_eq!(blocks, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn order_is_shuffled() {
        let mut rng = StdRng::seed_from_u64(99);
        let generator = ConditionGenerator::new(vec![2, 6, 12, 18, 24, 30], vec![200, 400, 600], 60);
        let trials = generator.generate(10, TrialPhase::Main, &mut rng).unwrap();
        // The unshuffled order starts with ten set-size-2 trials.
        let leading_twos = trials.iter().take_while(|t| t.set_size == 2).count();
        assert!(leading_twos < 10);
    }
}
