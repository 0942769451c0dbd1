//! Merge log produced by the agglomerative clustering stage
//!
//! The log is line-oriented text:
//!
//! ```text
//! 2          <- target cluster count
//! 0,1        <- merge creating synthetic index vertex_count + 0
//! 2, 3       <- merge creating synthetic index vertex_count + 1
//! ```
//!
//! Whitespace around fields is ignored and trailing blank lines are allowed.
//! Anything else that is not two non-negative integers fails the whole parse
//! with the 1-based line number.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use clustermesh_core::{Error, Result};
use itertools::Itertools;

/// One pairwise merge from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRecord {
    /// Zero-based position among the merge records (merge order).
    pub position: usize,
    /// 1-based line number in the source text.
    pub line: usize,
    pub left: usize,
    pub right: usize,
}

impl MergeRecord {
    /// Synthetic cluster index created by this merge.
    pub fn new_index(&self, vertex_count: usize) -> usize {
        vertex_count + self.position
    }
}

/// Parsed merge log: a target cluster count and the merges in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeLog {
    target_cluster_count: usize,
    records: Vec<MergeRecord>,
}

impl MergeLog {
    /// Build a log from a target count and `(left, right)` pairs in merge order.
    pub fn new(target_cluster_count: usize, merges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let records = merges
            .into_iter()
            .enumerate()
            .map(|(position, (left, right))| MergeRecord {
                position,
                line: position + 2,
                left,
                right,
            })
            .collect();
        Self {
            target_cluster_count,
            records,
        }
    }

    /// Parse the text form of a merge log.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let (first, rest) = lines
            .split_first()
            .ok_or_else(|| Error::parse(1, "merge log is empty"))?;

        let target_field = first.trim();
        let target_cluster_count = target_field.parse::<usize>().map_err(|e| {
            Error::parse(
                1,
                format!("invalid target cluster count '{}': {}", target_field, e),
            )
        })?;

        let records = rest
            .iter()
            .enumerate()
            .map(|(position, raw)| parse_record(position, position + 2, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            target_cluster_count,
            records,
        })
    }

    /// Read and parse a merge log from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Read and parse a merge log file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn target_cluster_count(&self) -> usize {
        self.target_cluster_count
    }

    pub fn records(&self) -> &[MergeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vertex count for which this log merges everything into one cluster.
    pub fn complete_vertex_count(&self) -> usize {
        self.records.len() + 1
    }

    /// Reject vertex counts larger than any log of this length can describe.
    pub fn check_vertex_count(&self, vertex_count: usize) -> Result<()> {
        let max = self.complete_vertex_count();
        if vertex_count == 0 || vertex_count > max {
            return Err(Error::Configuration(format!(
                "vertex count {} does not fit a merge log with {} record(s) (expected 1 to {})",
                vertex_count,
                self.records.len(),
                max
            )));
        }
        Ok(())
    }
}

fn parse_record(position: usize, line: usize, raw: &str) -> Result<MergeRecord> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    let (left, right) = fields.iter().collect_tuple().ok_or_else(|| {
        Error::parse(
            line,
            format!(
                "expected 2 comma-separated cluster indices, found {} field(s)",
                fields.len()
            ),
        )
    })?;

    Ok(MergeRecord {
        position,
        line,
        left: parse_index(line, left)?,
        right: parse_index(line, right)?,
    })
}

fn parse_index(line: usize, field: &str) -> Result<usize> {
    field
        .parse::<usize>()
        .map_err(|e| Error::parse(line, format!("invalid cluster index '{}': {}", field, e)))
}

impl FromStr for MergeLog {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MergeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_cluster_count)?;
        for record in &self.records {
            write!(f, "\n{},{}", record.left, record.right)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic() {
        let log = MergeLog::parse("2\n0,1\n3,2\n").unwrap();
        assert_eq!(log.target_cluster_count(), 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].left, 0);
        assert_eq!(log.records()[0].right, 1);
        assert_eq!(log.records()[1].line, 3);
        assert_eq!(log.records()[1].new_index(4), 5);
    }

    #[test]
    fn test_parse_accepts_spaces_and_crlf() {
        // Clustering stage writes "a, b" and may emit CRLF line endings
        let log = MergeLog::parse("3\r\n0, 1\r\n 2 ,4\r\n").unwrap();
        assert_eq!(log.target_cluster_count(), 3);
        assert_eq!((log.records()[1].left, log.records()[1].right), (2, 4));
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let log = MergeLog::parse("1\n0,1").unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_parse_target_only() {
        let log = MergeLog::parse("5").unwrap();
        assert!(log.is_empty());
        assert_eq!(log.target_cluster_count(), 5);
    }

    #[test]
    fn test_empty_log_fails_on_line_one() {
        for text in ["", "\n\n", "  \n"] {
            match MergeLog::parse(text) {
                Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
                other => panic!("expected parse error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_bad_target_count() {
        match MergeLog::parse("two\n0,1") {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("target cluster count"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_count_reports_line() {
        for bad in ["0", "0,1,2", "0;1"] {
            let text = format!("1\n0,1\n{}\n", bad);
            match MergeLog::parse(&text) {
                Err(Error::Parse { line, message }) => {
                    assert_eq!(line, 3);
                    assert!(message.contains("field"), "{}", message);
                }
                other => panic!("expected parse error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_negative_and_non_numeric_indices() {
        for bad in ["-1,2", "a,2", "1,2.5", "1,"] {
            let text = format!("1\n{}", bad);
            assert!(
                matches!(MergeLog::parse(&text), Err(Error::Parse { line: 2, .. })),
                "{:?} should fail",
                bad
            );
        }
    }

    #[test]
    fn test_interior_blank_line_is_an_error() {
        assert!(matches!(
            MergeLog::parse("1\n0,1\n\n2,3\n"),
            Err(Error::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_display_roundtrip() {
        let log = MergeLog::new(2, [(0, 1), (4, 2)]);
        let text = log.to_string();
        assert_eq!(text, "2\n0,1\n4,2");
        assert_eq!(text.parse::<MergeLog>().unwrap(), log);
    }

    #[test]
    fn test_vertex_count_bounded_by_log_length() {
        let log = MergeLog::parse("1\n0,1\n3,2").unwrap();
        assert_eq!(log.complete_vertex_count(), 3);
        assert!(log.check_vertex_count(3).is_ok());
        assert!(log.check_vertex_count(1).is_ok());
        assert!(matches!(log.check_vertex_count(4), Err(Error::Configuration(_))));
        assert!(matches!(log.check_vertex_count(0), Err(Error::Configuration(_))));
        assert!(matches!(
            log.check_vertex_count(usize::MAX),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1\n0, 1\n").unwrap();
        let log = MergeLog::from_file(file.path()).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("result.csv");
        assert!(matches!(MergeLog::from_file(missing), Err(Error::Io(_))));
    }
}
