use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, TreeclustError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Datatype {
    Protein,
    Dna,
}

impl Datatype {
    /// Flag value understood by phyml-style backends.
    pub fn flag(self) -> &'static str {
        match self {
            Datatype::Protein => "aa",
            Datatype::Dna => "nt",
        }
    }
}

impl std::str::FromStr for Datatype {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "protein" | "aa" => Ok(Datatype::Protein),
            "dna" | "nt" => Ok(Datatype::Dna),
            other => Err(format!("unknown datatype '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Phylip,
    Fasta,
}

impl std::str::FromStr for FileFormat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "phylip" | "phy" => Ok(FileFormat::Phylip),
            "fasta" | "fas" | "fa" => Ok(FileFormat::Fasta),
            other => Err(format!("unknown file format '{other}'")),
        }
    }
}

/// One multiple sequence alignment: parallel name/sequence rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    names: Vec<String>,
    seqs: Vec<String>,
}

impl Alignment {
    pub fn new(names: Vec<String>, seqs: Vec<String>) -> Result<Self> {
        if names.len() != seqs.len() {
            return Err(TreeclustError::BadInput {
                path: "<memory>".into(),
                reason: format!("{} names for {} sequences", names.len(), seqs.len()),
            });
        }
        if let Some(first) = seqs.first() {
            if seqs.iter().any(|s| s.len() != first.len()) {
                return Err(TreeclustError::BadInput {
                    path: "<memory>".into(),
                    reason: "rows have unequal length".into(),
                });
            }
        }
        Ok(Self { names, seqs })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_taxa(&self) -> usize {
        self.names.len()
    }

    pub fn seq_length(&self) -> usize {
        self.seqs.first().map_or(0, |s| s.len())
    }

    pub fn read(path: &Path, format: FileFormat) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TreeclustError::BadInput {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let parsed = match format {
            FileFormat::Phylip => Self::parse_phylip(&text),
            FileFormat::Fasta => Self::parse_fasta(&text),
        };
        parsed.map_err(|reason| TreeclustError::BadInput {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Relaxed phylip: header `ntax nchar`, then one `name sequence` row per
    /// line (sequence possibly split across whitespace).
    fn parse_phylip(text: &str) -> std::result::Result<Self, String> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or("empty file")?;
        let mut parts = header.split_whitespace();
        let ntax: usize = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or("bad phylip header")?;
        let mut names = Vec::with_capacity(ntax);
        let mut seqs = Vec::with_capacity(ntax);
        for line in lines {
            let mut toks = line.split_whitespace();
            let first = toks.next().ok_or("short phylip row")?;
            let rest: String = toks.collect();
            if names.len() == ntax {
                return Err("interleaved continuation blocks are not supported".into());
            }
            names.push(first.to_string());
            seqs.push(rest);
        }
        if names.len() != ntax {
            return Err(format!("expected {ntax} rows, found {}", names.len()));
        }
        Self::new(names, seqs).map_err(|e| e.to_string())
    }

    fn parse_fasta(text: &str) -> std::result::Result<Self, String> {
        let mut names = Vec::new();
        let mut seqs: Vec<String> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('>') {
                names.push(name.split_whitespace().next().unwrap_or(name).to_string());
                seqs.push(String::new());
            } else {
                let cur = seqs.last_mut().ok_or("sequence before first header")?;
                cur.push_str(line);
            }
        }
        if names.is_empty() {
            return Err("no fasta records".into());
        }
        Self::new(names, seqs).map_err(|e| e.to_string())
    }

    /// Sequential phylip, the format the external evaluators consume.
    pub fn write_phylip(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_string())
    }

    /// Column-wise concatenation keyed by taxon name. Taxa missing from one
    /// input are padded with gaps over that input's columns, so the result
    /// covers the union of taxa.
    pub fn concatenate<'a>(parts: impl IntoIterator<Item = &'a Alignment>) -> Result<Alignment> {
        let mut rows: BTreeMap<String, String> = BTreeMap::new();
        let mut width = 0usize;
        for aln in parts {
            let block = aln.seq_length();
            for (name, seq) in aln.names.iter().zip(&aln.seqs) {
                let row = rows.entry(name.clone()).or_default();
                while row.len() < width {
                    row.push('-');
                }
                row.push_str(seq);
            }
            width += block;
        }
        for row in rows.values_mut() {
            while row.len() < width {
                row.push('-');
            }
        }
        let (names, seqs): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        Alignment::new(names, seqs)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " {} {}", self.num_taxa(), self.seq_length())?;
        for (name, seq) in self.names.iter().zip(&self.seqs) {
            writeln!(f, "{:<10} {}", name, seq)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(rows: &[(&str, &str)]) -> Alignment {
        Alignment::new(
            rows.iter().map(|r| r.0.to_string()).collect(),
            rows.iter().map(|r| r.1.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Alignment::new(vec!["a".into(), "b".into()], vec!["AAA".into(), "AA".into()]).is_err());
    }

    #[test]
    fn parses_fasta() {
        let a = Alignment::parse_fasta(">a desc\nMKL\nVV\n>b\nMKLVV\n").unwrap();
        assert_eq!(a.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(a.seq_length(), 5);
    }

    #[test]
    fn parses_phylip() {
        let a = Alignment::parse_phylip(" 2 4\ntaxA MKLV\ntaxB MRLV\n").unwrap();
        assert_eq!(a.num_taxa(), 2);
        assert_eq!(a.seq_length(), 4);
    }

    #[test]
    fn concatenation_pads_missing_taxa() {
        let a = aln(&[("x", "AAA"), ("y", "CCC")]);
        let b = aln(&[("y", "GG"), ("z", "TT")]);
        let c = Alignment::concatenate([&a, &b]).unwrap();
        assert_eq!(c.num_taxa(), 3);
        assert_eq!(c.seq_length(), 5);
        let xi = c.names().iter().position(|n| n == "x").unwrap();
        assert_eq!(c.seqs[xi], "AAA--");
        let zi = c.names().iter().position(|n| n == "z").unwrap();
        assert_eq!(c.seqs[zi], "---TT");
    }
}
