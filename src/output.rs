//! Tab-delimited report over the recorded optimisation history.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::scorer::HistoryEntry;

pub const HEADER: [&str; 4] = ["Iteration", "CPU Time", "Likelihood", "Partition"];

pub fn write_history(path: &Path, history: &[HistoryEntry]) -> Result<()> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    render(&mut out, history)
}

fn render<W: Write>(out: &mut W, history: &[HistoryEntry]) -> Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))?;
    for (i, entry) in history.iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            i, entry.cpu_time, entry.score, entry.partition
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Partition;

    #[test]
    fn report_has_header_and_indexed_rows() {
        let history = vec![
            HistoryEntry {
                cpu_time: 0.5,
                score: -10.0,
                partition: Partition::new(vec![1, 1, 2]).unwrap(),
            },
            HistoryEntry {
                cpu_time: 1.5,
                score: -8.0,
                partition: Partition::new(vec![1, 2, 2]).unwrap(),
            },
        ];
        let mut buf = Vec::new();
        render(&mut buf, &history).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Iteration\tCPU Time\tLikelihood\tPartition");
        assert!(lines[1].starts_with("0\t0.5\t-10\t(1, 1, 2)"));
        assert!(lines[2].starts_with("1\t1.5\t-8\t(1, 2, 2)"));
        assert_eq!(lines.len(), 3);
    }
}
