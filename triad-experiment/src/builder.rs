//! Turns a stimulus set into the practice sample and the blocked sequence
//! of main-task triples.

use rand::Rng;
use rand::seq::{SliceRandom, index};
use triad_core::{ExperimentError, StimulusSet, Triple};

/// Contiguous run of main-task trials between two announcements. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    trials: Vec<Triple>,
}

impl Block {
    pub fn trials(&self) -> &[Triple] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Immutable output of [`TrialSetBuilder::build`]. Every triple indexes into
/// a stimulus set of exactly [`Self::stimulus_count`] items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSet {
    blocks: Vec<Block>,
    practice: Vec<Triple>,
    block_size: usize,
    stimulus_count: usize,
}

impl TrialSet {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn practice(&self) -> &[Triple] {
        &self.practice
    }

    /// Nominal block size used for trial numbering.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn stimulus_count(&self) -> usize {
        self.stimulus_count
    }

    pub fn main_len(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Concatenation of all blocks in order.
    pub fn main_sequence(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.blocks.iter().flat_map(|b| b.trials.iter())
    }
}

/// Every 3-combination of `0..n` in lexicographic order.
pub fn combinations(n: usize) -> Vec<Triple> {
    let mut out = Vec::with_capacity(choose3(n));
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                out.extend(Triple::new(a, b, c));
            }
        }
    }
    out
}

/// C(n, 3).
pub fn choose3(n: usize) -> usize {
    if n < 3 {
        0
    } else {
        n * (n - 1) * (n - 2) / 6
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSetBuilder {
    pub block_size: usize,
    pub repeat_passes: usize,
    pub practice_count: usize,
}

impl TrialSetBuilder {
    pub fn new(block_size: usize, repeat_passes: usize, practice_count: usize) -> Self {
        Self {
            block_size,
            repeat_passes,
            practice_count,
        }
    }

    /// Practice triples are sampled from the combination pool before the main
    /// sequence is shuffled. The main sequence repeats the shuffled pool
    /// `repeat_passes` times and is then shuffled once as a whole, so a triple
    /// may recur at any distance from its first showing.
    pub fn build<R: Rng + ?Sized>(
        &self,
        stimuli: &StimulusSet,
        rng: &mut R,
    ) -> Result<TrialSet, ExperimentError> {
        if stimuli.len() < 3 {
            return Err(ExperimentError::invalid(format!(
                "at least 3 stimuli are needed, got {}",
                stimuli.len()
            )));
        }
        if self.block_size == 0 {
            return Err(ExperimentError::invalid("block size must be positive"));
        }
        if self.repeat_passes == 0 {
            return Err(ExperimentError::invalid("repeat passes must be at least 1"));
        }

        let mut pool = combinations(stimuli.len());
        if self.practice_count > pool.len() {
            return Err(ExperimentError::invalid(format!(
                "{} practice trials requested but only {} triples exist",
                self.practice_count,
                pool.len()
            )));
        }

        let practice = index::sample(rng, pool.len(), self.practice_count)
            .into_iter()
            .map(|i| pool[i])
            .collect();

        pool.shuffle(rng);
        let mut sequence = Vec::with_capacity(pool.len() * self.repeat_passes);
        for _ in 0..self.repeat_passes {
            sequence.extend_from_slice(&pool);
        }
        sequence.shuffle(rng);

        let blocks = sequence
            .chunks(self.block_size)
            .map(|chunk| Block {
                trials: chunk.to_vec(),
            })
            .collect();

        Ok(TrialSet {
            blocks,
            practice,
            block_size: self.block_size,
            stimulus_count: stimuli.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, HashSet};

    fn stimuli(n: usize) -> StimulusSet {
        StimulusSet::from_template("img/img{i}.png", n).unwrap()
    }

    fn counts<'a>(triples: impl Iterator<Item = &'a Triple>) -> HashMap<Triple, usize> {
        let mut out = HashMap::new();
        for t in triples {
            *out.entry(*t).or_default() += 1;
        }
        out
    }

    #[test]
    fn combinations_of_four() {
        let all = combinations(4);
        let expected: Vec<Triple> = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]
            .iter()
            .map(|[a, b, c]| Triple::new(*a, *b, *c).unwrap())
            .collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn combination_count_matches_binomial() {
        for n in 0..12 {
            let all = combinations(n);
            assert_eq!(all.len(), choose3(n));
            assert_eq!(all.iter().collect::<HashSet<_>>().len(), all.len());
        }
        assert_eq!(choose3(10), 120);
    }

    #[test]
    fn each_pass_contributes_every_triple_once() {
        let set = stimuli(7);
        for passes in 1..=3 {
            let trials = TrialSetBuilder::new(6, passes, 0)
                .build(&set, &mut StdRng::seed_from_u64(11))
                .unwrap();
            assert_eq!(trials.main_len(), choose3(7) * passes);
            let seen = counts(trials.main_sequence());
            assert_eq!(seen.len(), choose3(7));
            assert!(seen.values().all(|&c| c == passes));
        }
    }

    #[test]
    fn blocks_partition_the_sequence() {
        // C(6,3) = 20 triples, twice, in blocks of 7: 6 blocks, last has 5.
        let trials = TrialSetBuilder::new(7, 2, 0)
            .build(&stimuli(6), &mut StdRng::seed_from_u64(5))
            .unwrap();
        let sizes: Vec<usize> = trials.blocks.iter().map(Block::len).collect();
        assert_eq!(sizes, [7, 7, 7, 7, 7, 5]);
        assert_eq!(trials.stimulus_count(), 6);
        assert_eq!(trials.block_size(), 7);
    }

    #[test]
    fn exact_multiple_leaves_full_last_block() {
        let trials = TrialSetBuilder::new(2, 1, 0)
            .build(&stimuli(4), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(trials.blocks.len(), 2);
        assert!(trials.blocks.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn block_count_is_ceiling() {
        let set = stimuli(5);
        for block_size in 1..=12 {
            let trials = TrialSetBuilder::new(block_size, 1, 0)
                .build(&set, &mut StdRng::seed_from_u64(2))
                .unwrap();
            let m = trials.main_len();
            assert_eq!(trials.blocks.len(), m.div_ceil(block_size));
            let last = trials.blocks.last().unwrap().len();
            let expected_last = if m % block_size == 0 { block_size } else { m % block_size };
            assert_eq!(last, expected_last);
        }
    }

    #[test]
    fn practice_is_drawn_without_replacement() {
        let trials = TrialSetBuilder::new(20, 2, 10)
            .build(&stimuli(5), &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(trials.practice.len(), 10);
        let unique: HashSet<_> = trials.practice.iter().collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn practice_can_use_the_whole_pool() {
        let trials = TrialSetBuilder::new(2, 1, 4)
            .build(&stimuli(4), &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(trials.practice.len(), 4);
    }

    #[test]
    fn oversized_practice_is_rejected() {
        let err = TrialSetBuilder::new(2, 1, 5)
            .build(&stimuli(4), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, ExperimentError::InvalidConfiguration(_)));
    }

    #[test]
    fn too_few_stimuli_is_rejected() {
        let err = TrialSetBuilder::new(2, 1, 0)
            .build(&stimuli(2), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, ExperimentError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(
            TrialSetBuilder::new(0, 1, 0)
                .build(&stimuli(4), &mut StdRng::seed_from_u64(0))
                .is_err()
        );
    }

    #[test]
    fn same_seed_same_trials() {
        let builder = TrialSetBuilder::new(20, 2, 5);
        let set = stimuli(10);
        let a = builder.build(&set, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = builder.build(&set, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        let c = builder.build(&set, &mut StdRng::seed_from_u64(43)).unwrap();
        assert_ne!(a, c);
    }
}
