use std::collections::HashMap;

use tracing::debug;

use crate::backend::{ClusterArtifact, Evaluator, Model};
use crate::clock::Clock;
use crate::collection::Collection;
use crate::error::{Result, TreeclustError};
use crate::partition::Partition;
use crate::tree::Tree;

/// One row of the optimisation trace, written out by the reporting layer.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub cpu_time: f64,
    pub score: f64,
    pub partition: Partition,
}

/// Scores partitions through the evaluation backend.
///
/// A partition's fitness is the sum over its clusters of the log-likelihood
/// of each cluster's concatenated-alignment tree. Artifacts are cached by
/// their exact (sorted) member index set; identical membership always yields
/// an identical artifact, so the cache is append-only and never invalidated.
pub struct PartitionScorer {
    collection: Collection,
    backend: Box<dyn Evaluator>,
    clock: Box<dyn Clock>,
    model: Model,
    cache: HashMap<Vec<usize>, ClusterArtifact>,
    history: Vec<HistoryEntry>,
}

impl PartitionScorer {
    pub fn new(collection: Collection, backend: Box<dyn Evaluator>, clock: Box<dyn Clock>) -> Self {
        let model = Model::default_for(collection.datatype());
        Self {
            collection,
            backend,
            clock,
            model,
            cache: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn cached_artifacts(&self) -> usize {
        self.cache.len()
    }

    /// Infer guide trees for any records that still lack one.
    pub fn ensure_trees(&mut self) -> Result<()> {
        if !self.collection.has_trees() {
            let backend = self.backend.as_ref();
            self.collection.calc_nj_trees(backend)?;
        }
        Ok(())
    }

    fn check(&self, partition: &Partition) -> Result<()> {
        if partition.len() != self.collection.len() {
            return Err(TreeclustError::InvalidPartition(format!(
                "partition length {} != collection size {}",
                partition.len(),
                self.collection.len()
            )));
        }
        Ok(())
    }

    /// Artifact for an exact member set, computed at most once per set.
    pub fn artifact(&mut self, members: &[usize]) -> Result<&ClusterArtifact> {
        let mut key = members.to_vec();
        key.sort_unstable();
        key.dedup();
        if !self.cache.contains_key(&key) {
            debug!(members = ?key, "deriving cluster artifact");
            let concat = self.collection.concatenate(&key)?;
            let artifact = self.backend.infer(&concat, self.collection.datatype())?;
            self.cache.insert(key.clone(), artifact);
        }
        Ok(&self.cache[&key])
    }

    /// Pure function of partition membership (modulo caching). When
    /// `record_history` is set, appends a trace row as a side effect.
    pub fn score(&mut self, partition: &Partition, record_history: bool) -> Result<f64> {
        self.check(partition)?;
        let clusters = partition.clusters_of();
        let mut total = 0.0;
        for members in clusters.values() {
            total += self.artifact(members)?.score;
        }
        if record_history {
            self.history.push(HistoryEntry {
                cpu_time: self.clock.now(),
                score: total,
                partition: partition.clone(),
            });
        }
        Ok(total)
    }

    /// Fixed-topology fit of one record against a cluster's tree.
    pub fn fit(&self, record_index: usize, tree: &Tree) -> Result<f64> {
        let record = self.collection.record(record_index);
        Ok(self.backend.evaluate(
            &record.alignment,
            tree,
            self.model,
            self.collection.datatype(),
        )?)
    }

    /// Trees for every cluster of `partition`, keyed by label. Clones the
    /// cached trees so callers can evaluate fits without holding the cache.
    pub fn cluster_trees(
        &mut self,
        partition: &Partition,
    ) -> Result<std::collections::BTreeMap<u32, Tree>> {
        self.check(partition)?;
        let clusters = partition.clusters_of();
        let mut out = std::collections::BTreeMap::new();
        for (label, members) in &clusters {
            out.insert(*label, self.artifact(members)?.tree.clone());
        }
        Ok(out)
    }

    /// Cluster log-likelihood divided by total sequence length; a density
    /// diagnostic for ranking clusters.
    pub fn cluster_density(&mut self, members: &[usize]) -> Result<f64> {
        let total_len = self.collection.total_seq_length(members) as f64;
        let score = self.artifact(members)?.score;
        Ok(score / total_len)
    }
}
