use std::path::Path;

use tracing::info;

use crate::alignment::{Alignment, Datatype, FileFormat};
use crate::backend::Evaluator;
use crate::error::{Result, TreeclustError};
use crate::tree::Tree;

/// One alignment plus (once computed) its guide tree.
#[derive(Clone, Debug)]
pub struct Record {
    pub name: String,
    pub alignment: Alignment,
    pub tree: Option<Tree>,
}

impl Record {
    pub fn new(name: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            name: name.into(),
            alignment,
            tree: None,
        }
    }

    /// Guide tree; only valid after [`Collection::calc_nj_trees`].
    pub fn tree(&self) -> Result<&Tree> {
        self.tree.as_ref().ok_or_else(|| {
            TreeclustError::BadInput {
                path: self.name.clone(),
                reason: "record has no tree; call calc_nj_trees first".into(),
            }
        })
    }
}

/// The full set of input alignments, in deterministic (name-sorted) order.
/// Item indices used by partitions and the scorer are positions in `records`.
pub struct Collection {
    records: Vec<Record>,
    datatype: Datatype,
}

impl Collection {
    pub fn new(records: Vec<Record>, datatype: Datatype) -> Result<Self> {
        if records.is_empty() {
            return Err(TreeclustError::BadInput {
                path: "<collection>".into(),
                reason: "no records".into(),
            });
        }
        Ok(Self { records, datatype })
    }

    /// Load every alignment file in `dir` (non-recursive), sorted by file
    /// name so indices are stable across runs.
    pub fn from_directory(dir: &Path, format: FileFormat, datatype: Datatype) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            records.push(Record::new(name, Alignment::read(&path, format)?));
        }
        info!(n = records.len(), dir = %dir.display(), "loaded collection");
        Self::new(records, datatype)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &Record {
        &self.records[index]
    }

    pub fn has_trees(&self) -> bool {
        self.records.iter().all(|r| r.tree.is_some())
    }

    /// Infer a guide tree for every record that lacks one.
    pub fn calc_nj_trees(&mut self, backend: &dyn Evaluator) -> Result<()> {
        info!("calculating NJ trees for collection");
        let datatype = self.datatype;
        for record in &mut self.records {
            if record.tree.is_none() {
                let artifact = backend.infer(&record.alignment, datatype)?;
                record.tree = Some(artifact.tree);
            }
        }
        Ok(())
    }

    /// Concatenated alignment over a member index set.
    pub fn concatenate(&self, members: &[usize]) -> Result<Alignment> {
        Alignment::concatenate(members.iter().map(|&i| &self.records[i].alignment))
    }

    /// Total sequence length over a member index set; the denominator of
    /// the cluster score-density diagnostic.
    pub fn total_seq_length(&self, members: &[usize]) -> usize {
        members
            .iter()
            .map(|&i| self.records[i].alignment.seq_length())
            .sum()
    }
}
