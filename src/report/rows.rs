//! Report rows
//!
//! Presentation rows for the two output views. Values are rounded here and
//! only here; the engine works at full precision.

use crate::sizing::{ClientAllocation, TierRecommendation};
use serde::{Deserialize, Serialize};

/// Decimal places for storage and throughput figures
pub const METRIC_DECIMALS: u32 = 3;

/// Decimal places for shares
pub const SHARE_DECIMALS: u32 = 6;

/// Decimal places for costs
pub const COST_DECIMALS: u32 = 2;

/// Tier-mode column order
pub const TIER_COLUMNS: [&str; 8] = [
    "Client",
    "Data_GB",
    "Avg_Read_Ops_s",
    "Avg_Write_Ops_s",
    "Total_IOPS",
    "Classification",
    "Recommended_Tier",
    "Estimated_Monthly_Cost",
];

/// Allocation-mode column order
pub const ALLOCATION_COLUMNS: [&str; 9] = [
    "Client",
    "Data_GB",
    "Avg_Read_Ops_s",
    "Avg_Write_Ops_s",
    "Total_IOPS",
    "Data_Share",
    "IOPS_Share",
    "Weighted_Share",
    "Monthly_Cost",
];

/// Render a number the way spreadsheet tooling reads it back: the shortest
/// round-trip form, whole numbers with one decimal ("3000.0"), and an
/// exponent of at least two digits outside [1e-4, 1e16) ("1e-05")
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => match exponent.parse::<i32>() {
                Ok(exp) => format!(
                    "{}e{}{:02}",
                    mantissa,
                    if exp < 0 { '-' } else { '+' },
                    exp.abs()
                ),
                Err(_) => formatted,
            },
            None => formatted,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

// =============================================================================
// Tier Row
// =============================================================================

/// One line of the tier-recommendation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRow {
    #[serde(rename = "Client")]
    pub client: String,
    #[serde(rename = "Data_GB")]
    pub data_gb: f64,
    #[serde(rename = "Avg_Read_Ops_s")]
    pub avg_read_ops_s: f64,
    #[serde(rename = "Avg_Write_Ops_s")]
    pub avg_write_ops_s: f64,
    #[serde(rename = "Total_IOPS")]
    pub total_iops: f64,
    #[serde(rename = "Classification")]
    pub classification: String,
    #[serde(rename = "Recommended_Tier")]
    pub recommended_tier: String,
    #[serde(rename = "Estimated_Monthly_Cost")]
    pub estimated_monthly_cost: f64,
}

impl From<&TierRecommendation> for TierRow {
    fn from(rec: &TierRecommendation) -> Self {
        let record = &rec.record;
        Self {
            client: record.client.clone(),
            data_gb: round_to(record.data_gb, METRIC_DECIMALS),
            avg_read_ops_s: round_to(record.avg_read_ops_s, METRIC_DECIMALS),
            avg_write_ops_s: round_to(record.avg_write_ops_s, METRIC_DECIMALS),
            total_iops: round_to(record.total_iops(), METRIC_DECIMALS),
            classification: rec.classification.to_string(),
            recommended_tier: rec.tier.clone(),
            estimated_monthly_cost: round_to(rec.monthly_cost, COST_DECIMALS),
        }
    }
}

impl TierRow {
    /// Cells in column order
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.client.clone(),
            format_number(self.data_gb),
            format_number(self.avg_read_ops_s),
            format_number(self.avg_write_ops_s),
            format_number(self.total_iops),
            self.classification.clone(),
            self.recommended_tier.clone(),
            format_number(self.estimated_monthly_cost),
        ]
    }
}

// =============================================================================
// Allocation Row
// =============================================================================

/// One line of the proportional-allocation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    #[serde(rename = "Client")]
    pub client: String,
    #[serde(rename = "Data_GB")]
    pub data_gb: f64,
    #[serde(rename = "Avg_Read_Ops_s")]
    pub avg_read_ops_s: f64,
    #[serde(rename = "Avg_Write_Ops_s")]
    pub avg_write_ops_s: f64,
    #[serde(rename = "Total_IOPS")]
    pub total_iops: f64,
    #[serde(rename = "Data_Share")]
    pub data_share: f64,
    #[serde(rename = "IOPS_Share")]
    pub iops_share: f64,
    #[serde(rename = "Weighted_Share")]
    pub weighted_share: f64,
    #[serde(rename = "Monthly_Cost")]
    pub monthly_cost: f64,
}

impl From<&ClientAllocation> for AllocationRow {
    fn from(alloc: &ClientAllocation) -> Self {
        let record = &alloc.record;
        Self {
            client: record.client.clone(),
            data_gb: round_to(record.data_gb, METRIC_DECIMALS),
            avg_read_ops_s: round_to(record.avg_read_ops_s, METRIC_DECIMALS),
            avg_write_ops_s: round_to(record.avg_write_ops_s, METRIC_DECIMALS),
            total_iops: round_to(record.total_iops(), METRIC_DECIMALS),
            data_share: round_to(alloc.data_share, SHARE_DECIMALS),
            iops_share: round_to(alloc.iops_share, SHARE_DECIMALS),
            weighted_share: round_to(alloc.weighted_share, SHARE_DECIMALS),
            monthly_cost: round_to(alloc.monthly_cost, COST_DECIMALS),
        }
    }
}

impl AllocationRow {
    /// Cells in column order
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.client.clone(),
            format_number(self.data_gb),
            format_number(self.avg_read_ops_s),
            format_number(self.avg_write_ops_s),
            format_number(self.total_iops),
            format_number(self.data_share),
            format_number(self.iops_share),
            format_number(self.weighted_share),
            format_number(self.monthly_cost),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ClientUsageRecord;
    use crate::sizing::WorkloadClass;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1306.0114, 3), 1306.011);
        assert_eq!(round_to(0.1234567, 6), 0.123457);
        assert_eq!(round_to(144000.004, 2), 144000.0);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(f64::MAX, 6), f64::MAX);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3000.0), "3000.0");
        assert_eq!(format_number(0.0), "0.0");
        assert_eq!(format_number(1228.8), "1228.8");
        assert_eq!(format_number(0.000123), "0.000123");
        assert_eq!(format_number(0.0001), "0.0001");
    }

    #[test]
    fn test_format_number_exponent_form() {
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(0.000015), "1.5e-05");
        assert_eq!(format_number(1e-6), "1e-06");
        assert_eq!(format_number(1e16), "1e+16");
        assert_eq!(format_number(2.5e300), "2.5e+300");
        assert_eq!(format_number(-0.00002), "-2e-05");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }

    #[test]
    fn test_tier_row() {
        let rec = TierRecommendation {
            record: ClientUsageRecord::new("acme", 1228.8, 884.7114, 421.3),
            classification: WorkloadClass::DataIntensive,
            tier: "M50".into(),
            monthly_cost: 3000.0,
        };
        let row = TierRow::from(&rec);

        assert_eq!(row.avg_read_ops_s, 884.711);
        assert_eq!(row.total_iops, 1306.011);
        assert_eq!(
            row.cells(),
            vec!["acme", "1228.8", "884.711", "421.3", "1306.011", "Data-Intensive", "M50", "3000.0"]
        );
        assert_eq!(row.cells().len(), TIER_COLUMNS.len());
    }

    #[test]
    fn test_allocation_row_json_uses_column_names() {
        let alloc = ClientAllocation {
            record: ClientUsageRecord::new("acme", 10.0, 1.0, 2.0),
            data_share: 1.0 / 3.0,
            iops_share: 0.5,
            weighted_share: 1.0 / 3.0,
            monthly_cost: 80_000.0 / 3.0,
            weights: None,
        };
        let row = AllocationRow::from(&alloc);
        assert_eq!(row.data_share, 0.333333);
        assert_eq!(row.monthly_cost, 26666.67);

        let json = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for column in ALLOCATION_COLUMNS {
            assert!(keys.contains(&column), "missing {column}");
        }
        assert_eq!(row.cells().len(), ALLOCATION_COLUMNS.len());
    }
}
