//! Cross-module scenario tests built on a deterministic stub backend.

use crate::alignment::{Alignment, Datatype};
use crate::backend::{BackendError, ClusterArtifact, Evaluator, Model};
use crate::clock::MockClock;
use crate::collection::{Collection, Record};
use crate::partition::Partition;
use crate::scorer::PartitionScorer;
use crate::tree::Tree;

mod scorer_test;

/// How the stub scores a per-record fit against a tree.
#[derive(Clone, Copy)]
pub enum FitRule {
    /// 1.0 if the record's taxon is a leaf of the tree, plus a small
    /// width-proportional tie-breaker. Records prefer their own cluster.
    OwnTaxon,
    /// Leaf count of the tree. Records prefer the biggest cluster.
    ClusterSize,
}

/// How the stub scores an inferred cluster artifact.
#[derive(Clone, Copy)]
pub enum ScoreRule {
    /// Concatenated width: partition fitness is constant, every move ties.
    Width,
    /// Width squared: rewards pooling columns into one cluster.
    WidthSquared,
    /// Negative width squared: punishes pooling, every pooling move regresses.
    NegWidthSquared,
}

pub struct StubEvaluator {
    pub fit: FitRule,
    pub score: ScoreRule,
    /// When set, every `evaluate` call fails like a crashed subprocess.
    pub fail_fits: bool,
}

impl StubEvaluator {
    pub fn new(fit: FitRule, score: ScoreRule) -> Self {
        Self {
            fit,
            score,
            fail_fits: false,
        }
    }
}

impl Evaluator for StubEvaluator {
    fn evaluate(
        &self,
        alignment: &Alignment,
        tree: &Tree,
        _model: Model,
        _datatype: Datatype,
    ) -> Result<f64, BackendError> {
        if self.fail_fits {
            return Err(BackendError::Failed {
                program: "stub".into(),
                detail: "simulated crash".into(),
            });
        }
        Ok(match self.fit {
            FitRule::OwnTaxon => {
                let taxa = tree.taxa();
                let hits = alignment
                    .names()
                    .iter()
                    .filter(|n| taxa.contains(n))
                    .count();
                hits as f64 + 0.001 * alignment.seq_length() as f64
            }
            FitRule::ClusterSize => tree.taxa().len() as f64,
        })
    }

    fn infer(
        &self,
        alignment: &Alignment,
        _datatype: Datatype,
    ) -> Result<ClusterArtifact, BackendError> {
        let leaves: Vec<String> = alignment
            .names()
            .iter()
            .map(|n| format!("{n}:1"))
            .collect();
        let tree = Tree::from_newick(format!("({});", leaves.join(",")));
        let w = alignment.seq_length() as f64;
        let score = match self.score {
            ScoreRule::Width => w,
            ScoreRule::WidthSquared => w * w,
            ScoreRule::NegWidthSquared => -w * w,
        };
        Ok(ClusterArtifact { tree, score })
    }
}

/// One single-taxon record per entry in `widths`; record `i` is taxon `t{i}`
/// with `widths[i]` alignment columns. Concatenating a member set therefore
/// yields a width equal to the members' width sum.
pub fn collection(widths: &[usize]) -> Collection {
    let records = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let aln =
                Alignment::new(vec![format!("t{i}")], vec!["A".repeat(w)]).unwrap();
            Record::new(format!("rec{i}"), aln)
        })
        .collect();
    Collection::new(records, Datatype::Protein).unwrap()
}

pub fn scorer(widths: &[usize], stub: StubEvaluator) -> PartitionScorer {
    PartitionScorer::new(collection(widths), Box::new(stub), Box::new(MockClock::new(0)))
}

pub fn partition(labels: &[u32]) -> Partition {
    Partition::new(labels.to_vec()).unwrap()
}
