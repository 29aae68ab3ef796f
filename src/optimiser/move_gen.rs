//! Move generation: sample unvisited items, score each against every
//! cluster's tree, and reassign the most (or least) confident ones.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::Result;
use crate::partition::Partition;

use super::Optimiser;

/// Which end of the confidence ranking supplies the reassigned items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoosePolicy {
    /// Move the items most confident about their best cluster.
    Max,
    /// Move the least confident items; these carry the most signal.
    Min,
}

impl Optimiser {
    /// Per-item fit of every sampled record against every cluster tree.
    /// Returns the column labels (sorted cluster labels) and the
    /// `sample.len() x labels.len()` score matrix.
    pub(crate) fn score_sample(
        &mut self,
        sample: &[usize],
        assignment: &Partition,
    ) -> Result<(Vec<u32>, Vec<Vec<f64>>)> {
        let trees = self.scorer_mut().cluster_trees(assignment)?;
        let labels: Vec<u32> = trees.keys().copied().collect();
        let mut matrix = Vec::with_capacity(sample.len());
        for &record_index in sample {
            let mut row = Vec::with_capacity(labels.len());
            for label in &labels {
                row.push(self.scorer().fit(record_index, &trees[label])?);
            }
            matrix.push(row);
        }
        Ok((labels, matrix))
    }

    /// Commit up to `nreassign` reassignments chosen from the score matrix.
    /// Each moved item goes to its arg-max cluster; which items move is
    /// decided on the row-normalised matrix per `policy`. Ranking ties are
    /// broken by original sample order (stable sort).
    pub(crate) fn make_new_assignment(
        &self,
        sample: &[usize],
        labels: &[u32],
        matrix: &[Vec<f64>],
        assignment: &Partition,
        nreassign: usize,
        policy: ChoosePolicy,
    ) -> Result<Partition> {
        // first column wins arg-max ties
        let argmax: Vec<usize> = matrix
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0usize, f64::NEG_INFINITY), |best, (j, &v)| {
                        if v > best.1 {
                            (j, v)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect();

        // row-normalise to a probability-like distribution
        let normalised: Vec<Vec<f64>> = matrix
            .iter()
            .map(|row| {
                let sum: f64 = row.iter().sum();
                if sum.abs() < f64::MIN_POSITIVE {
                    row.clone()
                } else {
                    row.iter().map(|v| v / sum).collect()
                }
            })
            .collect();

        let mut order: Vec<usize> = (0..sample.len()).collect();
        match policy {
            ChoosePolicy::Max => {
                let key: Vec<f64> = normalised
                    .iter()
                    .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
                    .collect();
                order.sort_by(|&a, &b| {
                    key[b].partial_cmp(&key[a]).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            ChoosePolicy::Min => {
                let key: Vec<f64> = normalised
                    .iter()
                    .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
                    .collect();
                order.sort_by(|&a, &b| {
                    key[a].partial_cmp(&key[b]).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }

        let mut moves: SmallVec<[(usize, u32); 16]> = SmallVec::new();
        for &i in order.iter().take(nreassign) {
            moves.push((sample[i], labels[argmax[i]]));
        }

        let mut next = assignment.clone();
        for (item, label) in moves {
            next = next.with_label(item, label)?;
        }
        Ok(next)
    }

    /// One move: draw a fresh sample (excluding `sampled`, which this call
    /// extends), score it, and reassign. When no unsampled items remain the
    /// episode's sampling is exhausted and the partition comes back
    /// unchanged.
    pub fn propose_move(
        &mut self,
        sample_size: usize,
        assignment: &Partition,
        nreassign: usize,
        policy: ChoosePolicy,
        sampled: &mut HashSet<usize>,
    ) -> Result<Partition> {
        let unsampled: Vec<usize> = (0..assignment.len())
            .filter(|i| !sampled.contains(i))
            .collect();
        if unsampled.is_empty() {
            debug!("sampling exhausted; move is a no-op");
            return Ok(assignment.clone());
        }

        let sample: Vec<usize> = if sample_size >= unsampled.len() {
            unsampled
        } else {
            unsampled
                .choose_multiple(self.rng_mut(), sample_size)
                .copied()
                .collect()
        };
        sampled.extend(sample.iter().copied());

        let (labels, matrix) = self.score_sample(&sample, assignment)?;
        self.make_new_assignment(&sample, &labels, &matrix, assignment, nreassign, policy)
    }
}
