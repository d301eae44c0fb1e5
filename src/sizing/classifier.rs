//! Workload Classifier
//!
//! Labels each client by whether its storage footprint, its throughput, or
//! both cross the intensity thresholds.

use crate::ingest::ClientUsageRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Workload Class
// =============================================================================

/// Workload profile of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadClass {
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Data-Intensive")]
    DataIntensive,
    #[serde(rename = "IOPS-Intensive")]
    IopsIntensive,
    #[serde(rename = "Data+IOPS Intensive")]
    DataAndIopsIntensive,
}

impl WorkloadClass {
    /// Build the class from the two independent intensity flags
    pub fn from_flags(data_intensive: bool, iops_intensive: bool) -> Self {
        match (data_intensive, iops_intensive) {
            (true, true) => WorkloadClass::DataAndIopsIntensive,
            (true, false) => WorkloadClass::DataIntensive,
            (false, true) => WorkloadClass::IopsIntensive,
            (false, false) => WorkloadClass::Moderate,
        }
    }

    /// Report label
    pub fn label(&self) -> &'static str {
        match self {
            WorkloadClass::Moderate => "Moderate",
            WorkloadClass::DataIntensive => "Data-Intensive",
            WorkloadClass::IopsIntensive => "IOPS-Intensive",
            WorkloadClass::DataAndIopsIntensive => "Data+IOPS Intensive",
        }
    }

    /// Check if storage crossed the data threshold
    pub fn is_data_intensive(&self) -> bool {
        matches!(
            self,
            WorkloadClass::DataIntensive | WorkloadClass::DataAndIopsIntensive
        )
    }

    /// Check if throughput crossed the IOPS threshold
    pub fn is_iops_intensive(&self) -> bool {
        matches!(
            self,
            WorkloadClass::IopsIntensive | WorkloadClass::DataAndIopsIntensive
        )
    }
}

impl fmt::Display for WorkloadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Classifier Configuration
// =============================================================================

/// Intensity thresholds, both inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// Storage at or above this is data-intensive (GB)
    pub data_intensive_gb: f64,
    /// Throughput at or above this is IOPS-intensive (ops/s)
    pub iops_intensive_ops: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            data_intensive_gb: 1024.0, // 1 TB
            iops_intensive_ops: 4000.0,
        }
    }
}

// =============================================================================
// Workload Classifier
// =============================================================================

/// Classifies clients by workload profile
#[derive(Debug, Clone, Default)]
pub struct WorkloadClassifier {
    config: ClassifierConfig,
}

impl WorkloadClassifier {
    /// Create a classifier with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a (storage, throughput) pair
    pub fn classify(&self, data_gb: f64, total_iops: f64) -> WorkloadClass {
        WorkloadClass::from_flags(
            data_gb >= self.config.data_intensive_gb,
            total_iops >= self.config.iops_intensive_ops,
        )
    }

    /// Classify a client record
    pub fn classify_record(&self, record: &ClientUsageRecord) -> WorkloadClass {
        self.classify(record.data_gb, record.total_iops())
    }

    /// Active thresholds
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}
