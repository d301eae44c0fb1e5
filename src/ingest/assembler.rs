//! Record Assembler
//!
//! Reads the raw rows of a usage export and merges them into one record per
//! client. The export interleaves two row shapes that share the client name
//! as key:
//!
//! ```text
//! size row       (4 fields): client | previous size | current size | growth
//! throughput row (5 fields): client | read ops/s | write ops/s | read % | write %
//! ```
//!
//! Rows of any other shape are expected noise and are dropped.

use super::normalize::{parse_number_checked, parse_size_checked, ValueIssue};
use super::record::{ClientDataset, ClientUsageRecord};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Field count of a size row
pub const SIZE_ROW_FIELDS: usize = 4;

/// Field count of a throughput row
pub const THROUGHPUT_ROW_FIELDS: usize = 5;

/// Index of the current size reading within a size row
const SIZE_COLUMN: usize = 2;

fn whitespace_run_re() -> &'static Regex {
    static WHITESPACE_RUN_RE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RUN_RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"))
}

// =============================================================================
// Row Shapes
// =============================================================================

/// Interpretation of one tokenized line
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow<'a> {
    /// Client storage reading
    Size { client: String, size: &'a str },
    /// Client throughput reading
    Throughput {
        client: String,
        read_ops: &'a str,
        write_ops: &'a str,
    },
    /// Any other field count
    Unrecognized { fields: usize },
}

/// Split a trimmed line into fields.
///
/// Tabs are tried first; when that yields fewer than four fields the line is
/// re-split on runs of two or more whitespace characters.
pub fn tokenize(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SIZE_ROW_FIELDS {
        whitespace_run_re().split(line).collect()
    } else {
        fields
    }
}

/// Normalize a client cell into the merge key
pub fn normalize_client(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl<'a> RawRow<'a> {
    /// Classify a line by its field count
    pub fn parse(line: &'a str) -> Self {
        let fields = tokenize(line);
        match fields.len() {
            SIZE_ROW_FIELDS => RawRow::Size {
                client: normalize_client(fields[0]),
                size: fields[SIZE_COLUMN],
            },
            THROUGHPUT_ROW_FIELDS => RawRow::Throughput {
                client: normalize_client(fields[0]),
                read_ops: fields[1],
                write_ops: fields[2],
            },
            n => RawRow::Unrecognized { fields: n },
        }
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Recovered condition found while assembling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WarningKind {
    /// Row had neither four nor five fields
    DroppedRow { fields: usize },
    /// A cell was normalized to zero
    ZeroedValue { column: String, issue: ValueIssue },
}

/// Warning surfaced in strict mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestWarning {
    /// 1-based line number in the input
    pub line: usize,
    #[serde(flatten)]
    pub kind: WarningKind,
}

/// Counters describing one assembly run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub lines: u64,
    pub blank_lines: u64,
    pub size_rows: u64,
    pub throughput_rows: u64,
    pub dropped_rows: u64,
    /// Rows that updated an already known client
    pub merged_rows: u64,
    /// Cells normalized to zero
    pub zeroed_values: u64,
}

/// Options for the assembler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerOptions {
    /// Collect every recovered condition as a warning
    pub strict: bool,
}

// =============================================================================
// Record Assembler
// =============================================================================

/// Builds the per-client dataset from raw lines
#[derive(Debug, Default)]
pub struct RecordAssembler {
    options: AssemblerOptions,
    records: IndexMap<String, ClientUsageRecord>,
    stats: IngestStats,
    warnings: Vec<IngestWarning>,
}

/// Output of an assembly run
#[derive(Debug, Clone)]
pub struct Assembly {
    pub dataset: ClientDataset,
    pub stats: IngestStats,
    /// Empty unless the assembler ran in strict mode
    pub warnings: Vec<IngestWarning>,
}

impl RecordAssembler {
    /// Create an assembler with default (lenient) options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler with custom options
    pub fn with_options(options: AssemblerOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Assemble a whole text export
    pub fn assemble_text(text: &str, options: AssemblerOptions) -> Assembly {
        let mut assembler = Self::with_options(options);
        assembler.extend(text.lines());
        assembler.finish()
    }

    /// Feed every line of an iterator
    pub fn extend<'a, I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            self.push_line(line);
        }
    }

    /// Feed a single raw line
    pub fn push_line(&mut self, line: &str) {
        self.stats.lines += 1;
        let line_no = self.stats.lines as usize;

        let line = line.trim();
        if line.is_empty() {
            self.stats.blank_lines += 1;
            return;
        }

        match RawRow::parse(line) {
            RawRow::Size { client, size } => {
                self.stats.size_rows += 1;
                let data_gb = self.read_value(line_no, "size", parse_size_checked(size));
                self.apply_size(client, data_gb);
            }
            RawRow::Throughput {
                client,
                read_ops,
                write_ops,
            } => {
                self.stats.throughput_rows += 1;
                let read = self.read_value(line_no, "readOps", parse_number_checked(read_ops));
                let write = self.read_value(line_no, "writeOps", parse_number_checked(write_ops));
                self.apply_throughput(client, read, write);
            }
            RawRow::Unrecognized { fields } => {
                self.drop_row(line_no, WarningKind::DroppedRow { fields });
            }
        }
    }

    /// Freeze the records into an immutable dataset
    pub fn finish(self) -> Assembly {
        debug!(
            clients = self.records.len(),
            lines = self.stats.lines,
            dropped = self.stats.dropped_rows,
            "Assembled client dataset"
        );

        Assembly {
            dataset: ClientDataset::from_records(self.records.into_values().collect()),
            stats: self.stats,
            warnings: self.warnings,
        }
    }

    fn apply_size(&mut self, client: String, data_gb: f64) {
        match self.records.get_mut(&client) {
            Some(record) => {
                self.stats.merged_rows += 1;
                record.data_gb = data_gb;
            }
            None => {
                self.records
                    .insert(client.clone(), ClientUsageRecord::with_size(client, data_gb));
            }
        }
    }

    fn apply_throughput(&mut self, client: String, read_ops: f64, write_ops: f64) {
        match self.records.get_mut(&client) {
            Some(record) => {
                // Overwrite, never accumulate
                self.stats.merged_rows += 1;
                record.avg_read_ops_s = read_ops;
                record.avg_write_ops_s = write_ops;
            }
            None => {
                self.records.insert(
                    client.clone(),
                    ClientUsageRecord::with_throughput(client, read_ops, write_ops),
                );
            }
        }
    }

    fn read_value(&mut self, line: usize, column: &str, parsed: Result<f64, ValueIssue>) -> f64 {
        match parsed {
            Ok(value) => value,
            Err(issue) => {
                self.stats.zeroed_values += 1;
                self.record_warning(
                    line,
                    WarningKind::ZeroedValue {
                        column: column.to_string(),
                        issue,
                    },
                );
                0.0
            }
        }
    }

    fn drop_row(&mut self, line: usize, kind: WarningKind) {
        self.stats.dropped_rows += 1;
        self.record_warning(line, kind);
    }

    fn record_warning(&mut self, line: usize, kind: WarningKind) {
        if self.options.strict {
            warn!(line, ?kind, "Recovered malformed input");
            self.warnings.push(IngestWarning { line, kind });
        } else {
            debug!(line, ?kind, "Recovered malformed input");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(text: &str) -> Assembly {
        RecordAssembler::assemble_text(text, AssemblerOptions::default())
    }

    #[test]
    fn test_tokenize_prefers_tabs() {
        assert_eq!(
            tokenize("acme\t1.00 TB\t1.20 TB\t5.00%"),
            vec!["acme", "1.00 TB", "1.20 TB", "5.00%"]
        );
    }

    #[test]
    fn test_tokenize_falls_back_to_whitespace_runs() {
        assert_eq!(
            tokenize("aahs  1.24 TB  1.26 TB  1.75%"),
            vec!["aahs", "1.24 TB", "1.26 TB", "1.75%"]
        );
        // Single spaces stay inside a field
        assert_eq!(tokenize("just one field"), vec!["just one field"]);
    }

    #[test]
    fn test_raw_row_shapes() {
        assert_eq!(
            RawRow::parse("ACME \t1 TB\t2 TB\t1%"),
            RawRow::Size {
                client: "acme".into(),
                size: "2 TB"
            }
        );
        assert_eq!(
            RawRow::parse("acme\t10\t20\t33%\t67%"),
            RawRow::Throughput {
                client: "acme".into(),
                read_ops: "10",
                write_ops: "20"
            }
        );
        assert_eq!(
            RawRow::parse("a\tb\tc\td\te\tf"),
            RawRow::Unrecognized { fields: 6 }
        );
    }

    #[test]
    fn test_size_then_throughput_merges() {
        let assembly = assemble("acme\t1.00 TB\t1.20 TB\t5.00%\nacme\t900.0\t100.0\t90%\t10%\n");

        assert_eq!(assembly.dataset.len(), 1);
        let acme = assembly.dataset.get("acme").unwrap();
        assert_eq!(acme.data_gb, 1228.8);
        assert_eq!(acme.avg_read_ops_s, 900.0);
        assert_eq!(acme.avg_write_ops_s, 100.0);
        assert_eq!(acme.total_iops(), 1000.0);
        assert_eq!(assembly.stats.merged_rows, 1);
    }

    #[test]
    fn test_throughput_then_size_merges() {
        let assembly = assemble("Acme\t900\t100\t90%\t10%\n  acme  \t1 TB\t2 TB\t5%\n");

        assert_eq!(assembly.dataset.len(), 1);
        let acme = assembly.dataset.get("acme").unwrap();
        assert_eq!(acme.data_gb, 2048.0);
        assert_eq!(acme.total_iops(), 1000.0);
    }

    #[test]
    fn test_throughput_overwrites() {
        let assembly = assemble("acme\t10\t20\t33%\t67%\nacme\t1\t2\t33%\t67%\n");

        let acme = assembly.dataset.get("acme").unwrap();
        assert_eq!(acme.avg_read_ops_s, 1.0);
        assert_eq!(acme.avg_write_ops_s, 2.0);
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let assembly = assemble(
            "zeta\t1 GB\t2 GB\t1%\nalpha\t1\t1\t50%\t50%\nmid\t1 GB\t3 GB\t1%\nzeta\t5\t5\t50%\t50%",
        );

        let clients: Vec<&str> = assembly
            .dataset
            .records()
            .iter()
            .map(|r| r.client.as_str())
            .collect();
        assert_eq!(clients, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_noise_is_dropped() {
        let text = "\n\
            Usage report\n\
            \n\
            acme\t1 TB\t1 TB\t0%\n\
            a\tb\tc\td\te\tf\n\
            \t\t\t\n";
        let assembly = assemble(text);

        assert_eq!(assembly.dataset.len(), 1);
        assert_eq!(assembly.stats.blank_lines, 3);
        assert_eq!(assembly.stats.dropped_rows, 2);
        assert!(assembly.warnings.is_empty());
    }

    #[test]
    fn test_malformed_values_zeroed() {
        let assembly = assemble("acme\t#DIV/0!\t#DIV/0!\t0%\nacme\tn/a\t#DIV/0!\t0%\t0%");

        let acme = assembly.dataset.get("acme").unwrap();
        assert_eq!(acme.data_gb, 0.0);
        assert_eq!(acme.total_iops(), 0.0);
        assert_eq!(assembly.stats.zeroed_values, 3);
    }

    #[test]
    fn test_strict_mode_collects_warnings() {
        let text = "acme\t1 TB\t#DIV/0!\t0%\nnoise line\n";
        let strict = RecordAssembler::assemble_text(text, AssemblerOptions { strict: true });
        let lenient = assemble(text);

        assert_eq!(strict.warnings.len(), 2);
        assert_eq!(
            strict.warnings[0],
            IngestWarning {
                line: 1,
                kind: WarningKind::ZeroedValue {
                    column: "size".into(),
                    issue: ValueIssue::ErrorSentinel
                }
            }
        );
        assert_eq!(strict.warnings[1].line, 2);
        assert!(matches!(
            strict.warnings[1].kind,
            WarningKind::DroppedRow { fields: 1 }
        ));

        // Strict mode never changes the dataset
        assert_eq!(strict.dataset, lenient.dataset);
        assert_eq!(strict.stats, lenient.stats);
    }
}
