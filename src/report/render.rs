//! Report rendering
//!
//! Builds the two report documents and renders them as CSV or JSON.

use super::rows::{AllocationRow, TierRow, ALLOCATION_COLUMNS, TIER_COLUMNS};
use crate::error::{Error, Result};
use crate::ingest::{IngestStats, IngestWarning};
use crate::sizing::{AllocationRun, AllocationSummary, SizingNotice, TierRun};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Output Format
// =============================================================================

/// Report serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Configuration(format!(
                "unsupported format '{}'; valid options: csv, json",
                other
            ))),
        }
    }
}

// =============================================================================
// Report Documents
// =============================================================================

/// Tier-recommendation report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<TierRow>,
    pub notices: Vec<SizingNotice>,
    pub stats: IngestStats,
    pub warnings: Vec<IngestWarning>,
}

impl From<&TierRun> for TierReport {
    fn from(run: &TierRun) -> Self {
        Self {
            generated_at: Utc::now(),
            rows: run.recommendations.iter().map(TierRow::from).collect(),
            notices: run.notices.clone(),
            stats: run.stats.clone(),
            warnings: run.warnings.clone(),
        }
    }
}

impl TierReport {
    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Csv => Ok(render_csv(
                &TIER_COLUMNS,
                self.rows.iter().map(TierRow::cells),
            )),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Proportional-allocation report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<AllocationRow>,
    pub summary: AllocationSummary,
    pub notices: Vec<SizingNotice>,
    pub stats: IngestStats,
    pub warnings: Vec<IngestWarning>,
}

impl From<&AllocationRun> for AllocationReport {
    fn from(run: &AllocationRun) -> Self {
        Self {
            generated_at: Utc::now(),
            rows: run
                .allocation
                .clients
                .iter()
                .map(AllocationRow::from)
                .collect(),
            summary: run.allocation.summary.clone(),
            notices: run.notices.clone(),
            stats: run.stats.clone(),
            warnings: run.warnings.clone(),
        }
    }
}

impl AllocationReport {
    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Csv => Ok(render_csv(
                &ALLOCATION_COLUMNS,
                self.rows.iter().map(AllocationRow::cells),
            )),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Render a header and rows as CSV text with a trailing newline
pub fn render_csv<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Quote a cell if it contains a comma, quote or line break
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::AssemblerOptions;
    use crate::sizing::SizingEngine;

    const REPORT: &str = "acme\t1.00 TB\t1.20 TB\t5.00%\nacme\t900.0\t100.0\t90%\t10%\n";

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("acme"), "acme");
        assert_eq!(csv_escape("acme, inc"), "\"acme, inc\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_tier_csv() {
        let run = SizingEngine::default().run_tiers(REPORT, AssemblerOptions::default());
        let csv = TierReport::from(&run).render(OutputFormat::Csv).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Client,Data_GB,Avg_Read_Ops_s,Avg_Write_Ops_s,Total_IOPS,Classification,Recommended_Tier,Estimated_Monthly_Cost"
        );
        assert_eq!(lines[1], "acme,1228.8,900.0,100.0,1000.0,Data-Intensive,M50,3000.0");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_allocation_csv() {
        let run = SizingEngine::default().run_allocation(REPORT, AssemblerOptions::default());
        let csv = AllocationReport::from(&run)
            .render(OutputFormat::Csv)
            .unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Client,Data_GB,Avg_Read_Ops_s,Avg_Write_Ops_s,Total_IOPS,Data_Share,IOPS_Share,Weighted_Share,Monthly_Cost"
        );
        assert_eq!(lines[1], "acme,1228.8,900.0,100.0,1000.0,1.0,1.0,1.0,240000.0");
    }

    #[test]
    fn test_json_report() {
        let run = SizingEngine::default().run_allocation(REPORT, AssemblerOptions { strict: true });
        let json = AllocationReport::from(&run)
            .render(OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["rows"][0]["Client"], "acme");
        assert_eq!(value["summary"]["mode"], "pureSize");
        assert_eq!(value["stats"]["mergedRows"], 1);
        assert!(value["generatedAt"].is_string());
        assert_eq!(value["notices"], serde_json::json!([]));
    }

    #[test]
    fn test_json_report_carries_notices() {
        let run = SizingEngine::default()
            .run_allocation("acme\t0.00 MB\t0.00 MB\t0%\n", AssemblerOptions::default());
        let json = AllocationReport::from(&run)
            .render(OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["notices"][0]["kind"], "zeroTotal");
        assert_eq!(value["notices"][0]["dimension"], "data");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
