//! The optimisation engine: stochastic local search over partitions, plus
//! the exhaustive merge search, the split search, and the macro loop that
//! alternates them until the merge step stops paying.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::error::Result;
use crate::partition::Partition;
use crate::scorer::{HistoryEntry, PartitionScorer};

mod local;
mod merge_split;
mod move_gen;

pub use local::SearchState;
pub use move_gen::ChoosePolicy;

/// Score differences below this are ties.
pub const EPS: f64 = 1e-8;

/// Knobs for one local-search episode and the surrounding macro loop.
#[derive(Clone, Debug)]
pub struct SearchLimits {
    /// items drawn per move
    pub sample_size: usize,
    /// reassignments committed per move
    pub nreassign: usize,
    /// consecutive ties tolerated before stopping
    pub max_stayed_put: usize,
    /// resets tolerated before stopping
    pub max_resets: usize,
    /// consecutive regressions before a reset
    pub max_done_worse: usize,
    /// hard iteration cap per episode
    pub max_iter: usize,
    /// trip cap for the merge/split macro loop
    pub max_rounds: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            sample_size: 10,
            nreassign: 10,
            max_stayed_put: 5,
            max_resets: 5,
            max_done_worse: 5,
            max_iter: 1000,
            max_rounds: 100,
        }
    }
}

/// Owns the scorer, the RNG, and the best partition found so far. The
/// global best persists across `optimise` calls until explicitly replaced;
/// all per-episode state lives in [`SearchState`] inside each call.
pub struct Optimiser {
    scorer: PartitionScorer,
    rng: StdRng,
    global_best: Partition,
    global_best_score: f64,
    nclusters: u32,
    merges: usize,
}

impl Optimiser {
    /// Seeds the search with a uniform random `nclusters`-way assignment.
    pub fn new(nclusters: u32, scorer: PartitionScorer, seed: Option<u64>) -> Result<Self> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let initial = Partition::random(scorer.collection().len(), nclusters, &mut rng)?;
        Self::with_initial(nclusters, scorer, rng, initial)
    }

    pub fn with_initial(
        nclusters: u32,
        mut scorer: PartitionScorer,
        rng: StdRng,
        initial: Partition,
    ) -> Result<Self> {
        scorer.ensure_trees()?;
        info!("calculating initial score");
        let score = scorer.score(&initial, false)?;
        info!(score, partition = %initial, "initial assignment");
        Ok(Self {
            scorer,
            rng,
            global_best: initial,
            global_best_score: score,
            nclusters,
            merges: 0,
        })
    }

    pub fn global_best(&self) -> &Partition {
        &self.global_best
    }

    pub fn global_best_score(&self) -> f64 {
        self.global_best_score
    }

    pub fn nclusters(&self) -> u32 {
        self.nclusters
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.scorer.history()
    }

    pub fn scorer(&self) -> &PartitionScorer {
        &self.scorer
    }

    pub(crate) fn scorer_mut(&mut self) -> &mut PartitionScorer {
        &mut self.scorer
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Replace the global best with `assignment` (re-scored), keeping the
    /// advertised cluster count in step.
    pub fn update(&mut self, assignment: Partition) -> Result<()> {
        self.global_best_score = self.scorer.score(&assignment, false)?;
        self.nclusters = assignment.max_label();
        self.global_best = assignment;
        Ok(())
    }

    /// One full-collection move pass, folded into the global best only if
    /// it improves on it.
    pub fn final_assignment(&mut self) -> Result<()> {
        let n = self.global_best.len();
        let mut sampled = std::collections::HashSet::new();
        let base = self.global_best.clone();
        let candidate = self.propose_move(n, &base, n, ChoosePolicy::Max, &mut sampled)?;
        let score = self.scorer.score(&candidate, false)?;
        if score > self.global_best_score {
            self.global_best_score = score;
            self.global_best = candidate;
        }
        Ok(())
    }

    /// Alternate local search, split search, and merge search until the
    /// merged score stops moving. Iterative with a bounded trip count.
    pub fn optimise_with_merge(
        &mut self,
        assignment: &Partition,
        update: bool,
        limits: &SearchLimits,
    ) -> Result<Partition> {
        let mut current = assignment.clone();
        let mut converged = None;

        for round in 0..limits.max_rounds {
            let optimised = self.optimise(&current, false, true, limits)?;
            let opt_score = self.scorer.score(&optimised, false)?;
            self.merges += 1;
            info!(round, merges = self.merges, score = opt_score, partition = %optimised,
                "partition after local search");

            let split = self.split_search(&optimised)?;
            let mut bounded = limits.clone();
            bounded.max_iter = 10;
            let split = self.optimise(&split, false, false, &bounded)?;
            info!(round, score = self.scorer.score(&split, false)?, partition = %split,
                "partition after split search");

            let (merged, merged_score) = if split.num_clusters() < 2 {
                let s = self.scorer.score(&split, false)?;
                (split, s)
            } else {
                self.merge_closest(&split)?
            };
            info!(round, score = merged_score, partition = %merged, "partition after merge search");

            if (merged_score - opt_score).abs() > EPS {
                current = merged;
            } else {
                converged = Some(merged);
                break;
            }
        }

        let result = match converged {
            Some(p) => p,
            None => {
                warn!(max_rounds = limits.max_rounds, "merge loop hit its trip cap");
                current
            }
        };
        if update {
            self.update(result.clone())?;
        }
        Ok(result)
    }
}
