//! The local search engine: repeated moves with stall/reset bookkeeping.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{Result, TreeclustError};
use crate::partition::Partition;

use super::{ChoosePolicy, Optimiser, SearchLimits, EPS};

/// Transient per-episode counters, passed through the loop rather than kept
/// as ambient object state so each `optimise` call is reentrant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub iteration: usize,
    pub stayed_put: usize,
    pub done_worse: usize,
    pub resets: usize,
}

impl Optimiser {
    /// One local-search episode starting from `assignment`. Tracks the best
    /// partition seen; ties bump the stall counter, regressions bump the
    /// done-worse counter, and a run of regressions resets the working
    /// partition to the episode best. Ends on the stall limit, the reset
    /// limit, or the iteration cap. With `update` the episode best is folded
    /// into the persistent global best.
    pub fn optimise(
        &mut self,
        assignment: &Partition,
        update: bool,
        history: bool,
        limits: &SearchLimits,
    ) -> Result<Partition> {
        let mut state = SearchState::default();
        let mut local_best = assignment.clone();
        let mut local_best_score = self.scorer_mut().score(&local_best, history)?;
        let mut current = local_best.clone();
        let mut sampled: HashSet<usize> = HashSet::new();

        info!(score = local_best_score, partition = %current, "optimising");

        loop {
            if state.stayed_put > limits.max_stayed_put {
                info!(limit = limits.max_stayed_put, "stayed put too many times");
                break;
            }
            if state.done_worse == limits.max_done_worse {
                info!("wandered off, resetting to episode best");
                state.resets += 1;
                state.done_worse = 0;
                // sampled set is intentionally kept across a reset; it only
                // clears on improvement or regression
                current = local_best.clone();
            }
            if state.resets == limits.max_resets {
                info!(limit = limits.max_resets, "reset limit reached");
                break;
            }
            if state.iteration == limits.max_iter {
                info!(limit = limits.max_iter, "max iterations reached");
                break;
            }

            let outcome = self
                .propose_move(
                    limits.sample_size,
                    &current,
                    limits.nreassign,
                    ChoosePolicy::Max,
                    &mut sampled,
                )
                .and_then(|candidate| {
                    let score = self.scorer_mut().score(&candidate, history)?;
                    Ok((candidate, score))
                });
            let (candidate, score) = match outcome {
                Ok(pair) => pair,
                // A backend failure is fatal to the candidate, not the run:
                // degrade it below anything the episode has seen.
                Err(TreeclustError::Backend(err)) => {
                    warn!(%err, "evaluation failed; discarding candidate");
                    (current.clone(), f64::NEG_INFINITY)
                }
                Err(other) => return Err(other),
            };
            debug!(score, partition = %candidate, "scored candidate");

            if score > local_best_score {
                sampled.clear();
                local_best_score = score;
                local_best = candidate.clone();
                current = candidate;
                state.stayed_put = 0;
                state.done_worse = 0;
                state.resets = 0;
            } else if (score - local_best_score).abs() < EPS {
                state.stayed_put += 1;
                state.done_worse = 0;
            } else {
                sampled.clear();
                state.stayed_put = 0;
                state.done_worse += 1;
            }
            state.iteration += 1;
            debug!(?state, best = local_best_score, "iteration complete");
        }

        info!(iterations = state.iteration, score = local_best_score,
            partition = %local_best, "episode finished");

        if update {
            self.update(local_best.clone())?;
        }
        Ok(local_best)
    }
}
