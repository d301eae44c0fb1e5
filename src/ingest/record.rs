//! Client usage records
//!
//! One record per client, keyed by the normalized client name. Records are
//! only mutated by the assembler; once frozen into a [`ClientDataset`] they
//! are read-only for every consumer.

use serde::{Deserialize, Serialize};

// =============================================================================
// Client Usage Record
// =============================================================================

/// Normalized usage for one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUsageRecord {
    /// Lowercase, trimmed client identifier
    pub client: String,
    /// Storage footprint in gigabytes
    pub data_gb: f64,
    /// Average read operations per second
    pub avg_read_ops_s: f64,
    /// Average write operations per second
    pub avg_write_ops_s: f64,
}

impl ClientUsageRecord {
    /// Create a record from a size row
    pub fn with_size(client: impl Into<String>, data_gb: f64) -> Self {
        Self {
            client: client.into(),
            data_gb,
            avg_read_ops_s: 0.0,
            avg_write_ops_s: 0.0,
        }
    }

    /// Create a record from a throughput row
    pub fn with_throughput(client: impl Into<String>, read_ops: f64, write_ops: f64) -> Self {
        Self {
            client: client.into(),
            data_gb: 0.0,
            avg_read_ops_s: read_ops,
            avg_write_ops_s: write_ops,
        }
    }

    /// Create a record with every field set
    pub fn new(client: impl Into<String>, data_gb: f64, read_ops: f64, write_ops: f64) -> Self {
        Self {
            client: client.into(),
            data_gb,
            avg_read_ops_s: read_ops,
            avg_write_ops_s: write_ops,
        }
    }

    /// Read plus write operations per second
    pub fn total_iops(&self) -> f64 {
        self.avg_read_ops_s + self.avg_write_ops_s
    }
}

// =============================================================================
// Client Dataset
// =============================================================================

/// Immutable set of client records in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientDataset {
    records: Vec<ClientUsageRecord>,
}

impl ClientDataset {
    /// Wrap records that already have unique client identifiers
    pub(crate) fn from_records(records: Vec<ClientUsageRecord>) -> Self {
        Self { records }
    }

    /// All records in first-seen order
    pub fn records(&self) -> &[ClientUsageRecord] {
        &self.records
    }

    /// Iterate over records
    pub fn iter(&self) -> std::slice::Iter<'_, ClientUsageRecord> {
        self.records.iter()
    }

    /// Look up a client by normalized identifier
    pub fn get(&self, client: &str) -> Option<&ClientUsageRecord> {
        self.records.iter().find(|r| r.client == client)
    }

    /// Number of clients
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no clients
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of storage across all clients (GB)
    pub fn total_data_gb(&self) -> f64 {
        self.records.iter().map(|r| r.data_gb).sum()
    }

    /// Sum of read plus write ops/s across all clients
    pub fn total_iops(&self) -> f64 {
        self.records.iter().map(ClientUsageRecord::total_iops).sum()
    }
}

impl<'a> IntoIterator for &'a ClientDataset {
    type Item = &'a ClientUsageRecord;
    type IntoIter = std::slice::Iter<'a, ClientUsageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<ClientUsageRecord> for ClientDataset {
    /// Collect records, merging duplicates by client identifier.
    ///
    /// A later record for the same client replaces the earlier one in place.
    fn from_iter<T: IntoIterator<Item = ClientUsageRecord>>(iter: T) -> Self {
        let mut merged: indexmap::IndexMap<String, ClientUsageRecord> = indexmap::IndexMap::new();
        for record in iter {
            merged.insert(record.client.clone(), record);
        }
        Self::from_records(merged.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_iops() {
        let record = ClientUsageRecord::with_throughput("acme", 884.711, 421.3);
        assert_eq!(record.data_gb, 0.0);
        assert!((record.total_iops() - 1306.011).abs() < 1e-9);
    }

    #[test]
    fn test_dataset_totals() {
        let dataset: ClientDataset = vec![
            ClientUsageRecord::new("a", 100.0, 10.0, 5.0),
            ClientUsageRecord::new("b", 300.0, 0.0, 85.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.total_data_gb(), 400.0);
        assert_eq!(dataset.total_iops(), 100.0);
        assert_eq!(dataset.get("b").map(|r| r.data_gb), Some(300.0));
        assert!(dataset.get("c").is_none());
    }

    #[test]
    fn test_collect_keeps_one_record_per_client() {
        let dataset: ClientDataset = vec![
            ClientUsageRecord::new("a", 1.0, 0.0, 0.0),
            ClientUsageRecord::new("b", 2.0, 0.0, 0.0),
            ClientUsageRecord::new("a", 3.0, 0.0, 0.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].client, "a");
        assert_eq!(dataset.records()[0].data_gb, 3.0);
    }
}
