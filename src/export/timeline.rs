//! Timeline export in Gource's custom log format.
//!
//! Each record is `timestamp|actor|action|payload`. The first record marks
//! the root; then every scanned term gets one record whose payload is the
//! slash-joined shortest path from the root to that term, so Gource grows
//! the neighborhood like a directory tree.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use log::debug;

use crate::error::{Result, SemtreeError};
use crate::expander::Expansion;

/// Gource action code for "added".
pub const ACTION_ADD: &str = "A";

/// One line of the timeline log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRecord {
    pub timestamp: i64,
    pub actor: String,
    pub action: &'static str,
    pub payload: String,
}

impl fmt::Display for TimelineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.timestamp, self.actor, self.action, self.payload
        )
    }
}

/// The login name of the current user, or `semtree` when unknown.
pub fn default_actor() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "semtree".to_string())
}

/// Builds timeline records from a finished traversal.
#[derive(Debug, Clone)]
pub struct TimelineWriter {
    actor: String,
    start: i64,
    step: i64,
}

impl TimelineWriter {
    /// Start the timeline now, advancing one second per record.
    pub fn new<S: Into<String>>(actor: S) -> Self {
        Self {
            actor: actor.into(),
            start: Utc::now().timestamp(),
            step: 1,
        }
    }

    #[must_use]
    pub fn start(mut self, timestamp: i64) -> Self {
        self.start = timestamp;
        self
    }

    /// Set the increment between records; must be positive.
    pub fn step(mut self, step: i64) -> Result<Self> {
        if step <= 0 {
            return Err(SemtreeError::invalid_argument(
                "timeline step must be positive",
            ));
        }
        self.step = step;
        Ok(self)
    }

    pub fn records(&self, expansion: &Expansion) -> Vec<TimelineRecord> {
        let mut now = self.start;
        let mut records = vec![self.record(now, expansion.root.clone())];

        let paths = match expansion.graph.shortest_paths_from(&expansion.root) {
            Some(paths) => paths,
            None => return records,
        };
        for term in expansion.timeline_terms() {
            match paths.path_to(&term) {
                Some(path) => {
                    now += self.step;
                    records.push(self.record(now, path.join("/")));
                }
                None => debug!("No path from '{}' to '{term}'", expansion.root),
            }
        }
        records
    }

    fn record(&self, timestamp: i64, payload: String) -> TimelineRecord {
        TimelineRecord {
            timestamp,
            actor: self.actor.clone(),
            action: ACTION_ADD,
            payload,
        }
    }

    pub fn write<W: Write>(&self, expansion: &Expansion, writer: &mut W) -> Result<usize> {
        let records = self.records(expansion);
        for record in &records {
            writeln!(writer, "{record}")?;
        }
        Ok(records.len())
    }

    pub fn save<P: AsRef<Path>>(&self, expansion: &Expansion, path: P) -> Result<usize> {
        let mut writer = BufWriter::new(File::create(path)?);
        let count = self.write(expansion, &mut writer)?;
        writer.flush()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::{Expander, ExpanderConfig};
    use crate::oracle::TableOracle;

    fn sample_expansion() -> Expansion {
        let oracle = TableOracle::new()
            .with_neighbors("a", [("b", 0.9)])
            .with_neighbors("b", [("c", 0.8)]);
        let config = ExpanderConfig::default().max_neighbors(2).min_similarity(0.3);
        Expander::new(&oracle, config).unwrap().expand("a").unwrap()
    }

    #[test]
    fn test_records() {
        let expansion = sample_expansion();
        let writer = TimelineWriter::new("alice").start(1000);

        let lines: Vec<String> = writer
            .records(&expansion)
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            lines,
            vec![
                "1000|alice|A|a",
                "1001|alice|A|a",
                "1002|alice|A|a/b",
                "1003|alice|A|a/b/c",
            ]
        );
    }

    #[test]
    fn test_custom_step() {
        let expansion = sample_expansion();
        let writer = TimelineWriter::new("bob").start(0).step(5).unwrap();

        let stamps: Vec<i64> = writer
            .records(&expansion)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(stamps, vec![0, 5, 10, 15]);
        assert!(TimelineWriter::new("bob").step(0).is_err());
    }

    #[test]
    fn test_write_counts_lines() {
        let expansion = sample_expansion();
        let mut out = Vec::new();
        let count = TimelineWriter::new("carol")
            .start(1)
            .write(&expansion, &mut out)
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 4);
    }
}
