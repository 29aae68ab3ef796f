//! phyml subprocess wrapper.
//!
//! Every call stages its alignment and tree under a fresh scratch directory
//! (`tempfile::Builder`), so concurrent or interleaved evaluations can never
//! clobber each other's inputs. The directory is removed on drop.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::Builder;
use tracing::debug;

use crate::alignment::{Alignment, Datatype};
use crate::tree::Tree;

use super::{BackendError, ClusterArtifact, Evaluator, Model};

pub struct PhymlEvaluator {
    program: PathBuf,
    tmpdir: PathBuf,
}

impl PhymlEvaluator {
    pub fn new(tmpdir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("phyml"),
            tmpdir: tmpdir.into(),
        }
    }

    /// Override the executable (e.g. an absolute path or a wrapper script).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn scratch(&self) -> Result<tempfile::TempDir, BackendError> {
        Ok(Builder::new()
            .prefix("treeclust_eval_")
            .tempdir_in(&self.tmpdir)?)
    }

    fn run(&self, args: &[&str], dir: &Path) -> Result<(), BackendError> {
        debug!(program = %self.program.display(), ?args, "running backend");
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| BackendError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(BackendError::Failed {
                program: self.program.display().to_string(),
                detail: format!(
                    "{}; stderr: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    /// Pull `Log-likelihood: <x>` out of the phyml stats file.
    fn parse_likelihood(stats_path: &Path) -> Result<f64, BackendError> {
        let text = std::fs::read_to_string(stats_path)?;
        for line in text.lines() {
            if let Some(pos) = line.find("Log-likelihood:") {
                let tail = line[pos + "Log-likelihood:".len()..].trim();
                let token = tail.split_whitespace().next().unwrap_or("");
                return token.parse::<f64>().map_err(|_| {
                    BackendError::Unparsable(format!("bad likelihood token '{token}'"))
                });
            }
        }
        Err(BackendError::Unparsable(format!(
            "no log-likelihood in {}",
            stats_path.display()
        )))
    }
}

impl Evaluator for PhymlEvaluator {
    fn evaluate(
        &self,
        alignment: &Alignment,
        tree: &Tree,
        model: Model,
        datatype: Datatype,
    ) -> Result<f64, BackendError> {
        let scratch = self.scratch()?;
        let aln_path = scratch.path().join("alignment.phy");
        let tree_path = scratch.path().join("tree.nwk");
        alignment.write_phylip(&aln_path)?;
        tree.write_to_file(&tree_path)?;

        // fixed topology, fixed branch lengths, no bootstraps
        self.run(
            &[
                "-i",
                "alignment.phy",
                "-u",
                "tree.nwk",
                "-b",
                "0",
                "-m",
                model.flag(),
                "-o",
                "n",
                "-d",
                datatype.flag(),
            ],
            scratch.path(),
        )?;
        Self::parse_likelihood(&scratch.path().join("alignment.phy_phyml_stats.txt"))
    }

    fn infer(
        &self,
        alignment: &Alignment,
        datatype: Datatype,
    ) -> Result<ClusterArtifact, BackendError> {
        let scratch = self.scratch()?;
        let aln_path = scratch.path().join("alignment.phy");
        alignment.write_phylip(&aln_path)?;

        let model = Model::default_for(datatype);
        // BioNJ starting tree, branch lengths fitted, topology kept
        self.run(
            &[
                "-i",
                "alignment.phy",
                "-b",
                "0",
                "-m",
                model.flag(),
                "-o",
                "lr",
                "-d",
                datatype.flag(),
            ],
            scratch.path(),
        )?;

        let score = Self::parse_likelihood(&scratch.path().join("alignment.phy_phyml_stats.txt"))?;
        let newick =
            std::fs::read_to_string(scratch.path().join("alignment.phy_phyml_tree.txt"))?;
        let newick = newick.trim();
        if newick.is_empty() {
            return Err(BackendError::Unparsable("empty tree file".into()));
        }
        Ok(ClusterArtifact {
            tree: Tree::from_newick(newick),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn likelihood_parsed_from_stats_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(
            &path,
            ". Model of amino acids substitution: WAG\n. Log-likelihood: -1234.5678\n",
        )
        .unwrap();
        let ll = PhymlEvaluator::parse_likelihood(&path).unwrap();
        assert!((ll + 1234.5678).abs() < 1e-9);
    }

    #[test]
    fn missing_likelihood_is_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, "nothing useful\n").unwrap();
        assert!(matches!(
            PhymlEvaluator::parse_likelihood(&path),
            Err(BackendError::Unparsable(_))
        ));
    }
}
