//! Exhaustive merge search and least-fit-member split search.

use tracing::{debug, info, warn};

use crate::error::{Result, TreeclustError};
use crate::partition::Partition;

use super::{ChoosePolicy, Optimiser};

impl Optimiser {
    /// Try every ordered pair of distinct clusters merged into one and keep
    /// the best-scoring result. O(k^2) scorings, no early exit, so the
    /// outcome is deterministic given a deterministic scorer.
    pub fn merge_closest(&mut self, assignment: &Partition) -> Result<(Partition, f64)> {
        info!("finding clusters to merge");
        let labels: Vec<u32> = assignment.clusters_of().keys().copied().collect();
        if labels.len() < 2 {
            return Err(TreeclustError::InvalidMove(
                "merge search needs at least two clusters".into(),
            ));
        }

        let mut best: Option<(Partition, f64)> = None;
        for &i in &labels {
            for &j in &labels {
                if i == j {
                    continue;
                }
                debug!(i, j, "testing merge");
                let candidate = assignment.merge(i, j)?;
                let score = match self.scorer_mut().score(&candidate, false) {
                    Ok(s) => s,
                    Err(TreeclustError::Backend(err)) => {
                        warn!(%err, i, j, "evaluation failed; skipping merge candidate");
                        continue;
                    }
                    Err(other) => return Err(other),
                };
                if best.as_ref().map_or(true, |(_, b)| score > *b) {
                    best = Some((candidate, score));
                }
            }
        }

        // labels.len() >= 2 and at least one pair was scored or skipped;
        // all-skipped means every merge failed to evaluate
        let (partition, score) = best.ok_or_else(|| {
            TreeclustError::InvalidMove("every merge candidate failed to evaluate".into())
        })?;
        info!(score, partition = %partition, "best merge");
        Ok((partition, score))
    }

    /// Split cluster `label` on its least representative member: the member
    /// whose fixed-topology fit against the cluster's own tree is lowest
    /// becomes a new singleton cluster, then every original member may
    /// redistribute between the old and new clusters.
    pub fn split(&mut self, label: u32, assignment: &Partition) -> Result<Partition> {
        let clusters = assignment.clusters_of();
        let members = clusters.get(&label).ok_or_else(|| {
            TreeclustError::InvalidPartition(format!("split of absent cluster {label}"))
        })?;
        let tree = self.scorer_mut().artifact(members)?.tree.clone();

        debug!(label, "scoring members against their own cluster tree");
        let mut seed = members[0];
        let mut min_fit = f64::INFINITY;
        for &i in members {
            let fit = self.scorer().fit(i, &tree)?;
            if fit < min_fit {
                min_fit = fit;
                seed = i;
            }
        }
        info!(seed, fit = min_fit, "splitting on least-fit member");

        let carved = assignment.split_item(seed)?;
        let (labels, matrix) = self.score_sample(members, &carved)?;
        self.make_new_assignment(
            members,
            &labels,
            &matrix,
            &carved,
            members.len(),
            ChoosePolicy::Max,
        )
    }

    /// Apply [`split`] to every cluster and keep the best-scoring result.
    /// A split that does not raise the cluster count by exactly one is
    /// corrupt and scores as negative infinity rather than aborting.
    pub fn split_search(&mut self, assignment: &Partition) -> Result<Partition> {
        let labels: Vec<u32> = assignment.clusters_of().keys().copied().collect();
        let k = assignment.num_clusters();
        let mut best: Option<(Partition, f64)> = None;

        for &label in &labels {
            let candidate = match self.split(label, assignment) {
                Ok(c) => c,
                Err(TreeclustError::Backend(err)) => {
                    warn!(%err, label, "evaluation failed; skipping split candidate");
                    continue;
                }
                Err(other) => return Err(other),
            };
            let score = if candidate.num_clusters() == k + 1 {
                match self.scorer_mut().score(&candidate, false) {
                    Ok(s) => s,
                    Err(TreeclustError::Backend(err)) => {
                        warn!(%err, label, "evaluation failed; skipping split candidate");
                        continue;
                    }
                    Err(other) => return Err(other),
                }
            } else {
                warn!(label, clusters = candidate.num_clusters(), expected = k + 1,
                    "split produced the wrong cluster count");
                f64::NEG_INFINITY
            };
            debug!(label, score, partition = %candidate, "split candidate");
            if best.as_ref().map_or(score > f64::NEG_INFINITY, |(_, b)| score > *b) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((partition, score)) => {
                info!(score, partition = %partition, "best split");
                Ok(partition)
            }
            None => {
                // no cluster produced a usable split; the search continues
                // from the unsplit partition
                warn!("no valid split found; keeping partition unchanged");
                Ok(assignment.clone())
            }
        }
    }
}
