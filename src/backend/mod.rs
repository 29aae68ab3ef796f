//! Capability interface over the external tree-evaluation programs.
//!
//! The search engine only ever talks to [`Evaluator`]; production code plugs
//! in the phyml subprocess wrapper, tests plug in deterministic stubs.

use thiserror::Error;

use crate::alignment::{Alignment, Datatype};
use crate::tree::Tree;

pub mod phyml;

pub use phyml::PhymlEvaluator;

/// Derived object for one fixed member set: its tree and the tree's
/// log-likelihood against the members' concatenated alignment.
#[derive(Clone, Debug)]
pub struct ClusterArtifact {
    pub tree: Tree,
    pub score: f64,
}

/// Substitution model passed through to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    Wag,
    Lg,
    Gtr,
}

impl Model {
    pub fn flag(self) -> &'static str {
        match self {
            Model::Wag => "WAG",
            Model::Lg => "LG",
            Model::Gtr => "GTR",
        }
    }

    pub fn default_for(datatype: Datatype) -> Self {
        match datatype {
            Datatype::Protein => Model::Wag,
            Datatype::Dna => Model::Gtr,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited abnormally: {detail}")]
    Failed { program: String, detail: String },

    #[error("unparsable backend output: {0}")]
    Unparsable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Blocking evaluation backend. Each call stages its inputs in a scratch
/// namespace owned by that call alone; implementations must never share
/// fixed temp file names between calls.
pub trait Evaluator: Send + Sync {
    /// Log-likelihood of `alignment` under the fixed topology `tree`
    /// (no branch-length or topology optimisation). Higher is better.
    fn evaluate(
        &self,
        alignment: &Alignment,
        tree: &Tree,
        model: Model,
        datatype: Datatype,
    ) -> Result<f64, BackendError>;

    /// Infer a tree for `alignment` and score it, yielding the cluster
    /// artifact cached by the scorer.
    fn infer(&self, alignment: &Alignment, datatype: Datatype) -> Result<ClusterArtifact, BackendError>;
}
