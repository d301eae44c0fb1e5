//! Proportional Allocator
//!
//! Splits a fixed monthly cluster cost across clients by their share of total
//! storage, optionally blended with their share of total throughput.

use super::notice::{ShareDimension, SizingNotice};
use crate::error::{Error, Result};
use crate::ingest::{normalize_client, ClientDataset, ClientUsageRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Denominator used when a cluster-wide total is exactly zero
pub const ZERO_TOTAL_EPSILON: f64 = 1e-9;

/// Tolerance for weight pairs and share sums
pub const SHARE_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Allocation Mode
// =============================================================================

/// How a client's weighted share is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllocationMode {
    /// Storage share only; throughput ignored
    #[default]
    PureSize,
    /// Storage and throughput shares blended by per-client weights
    Blended,
}

impl std::str::FromStr for AllocationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "puresize" | "size" => Ok(AllocationMode::PureSize),
            "blended" => Ok(AllocationMode::Blended),
            other => Err(Error::ApiValidation(format!(
                "Invalid allocation mode: {}. Use 'pureSize' or 'blended'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationMode::PureSize => write!(f, "pureSize"),
            AllocationMode::Blended => write!(f, "blended"),
        }
    }
}

// =============================================================================
// Weight Pair
// =============================================================================

/// Relative weight of storage and throughput; sums to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPair {
    pub data: f64,
    pub iops: f64,
}

impl WeightPair {
    pub const fn new(data: f64, iops: f64) -> Self {
        Self { data, iops }
    }

    /// Even split used for typical clients
    pub const fn even() -> Self {
        Self::new(0.5, 0.5)
    }

    /// Throughput-skewed split used for heavy-IOPS clients
    pub const fn heavy_iops() -> Self {
        Self::new(0.25, 0.75)
    }

    /// Blend a data share and an IOPS share
    pub fn blend(&self, data_share: f64, iops_share: f64) -> f64 {
        data_share * self.data + iops_share * self.iops
    }

    fn validate(&self, name: &str) -> Result<()> {
        let in_range = |w: f64| w.is_finite() && (0.0..=1.0).contains(&w);
        if in_range(self.data)
            && in_range(self.iops)
            && ((self.data + self.iops) - 1.0).abs() <= SHARE_TOLERANCE
        {
            Ok(())
        } else {
            Err(Error::InvalidWeights {
                name: name.to_string(),
                data: self.data,
                iops: self.iops,
            })
        }
    }
}

// =============================================================================
// Allocation Policy
// =============================================================================

/// Cost allocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationPolicy {
    /// Monthly cost of the whole cluster (USD)
    pub total_monthly_cost: f64,
    /// Share policy
    pub mode: AllocationMode,
    /// Weights for typical clients
    pub default_weights: WeightPair,
    /// Weights for heavy-IOPS clients
    pub heavy_weights: WeightPair,
    /// Clients always treated as heavy-IOPS
    pub heavy_iops_clients: BTreeSet<String>,
    /// Throughput at or above which a client is heavy-IOPS (ops/s)
    pub heavy_iops_threshold: f64,
    /// Rescale weighted shares so they sum to exactly 1
    pub normalize_shares: bool,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            total_monthly_cost: 240_000.0,
            mode: AllocationMode::PureSize,
            default_weights: WeightPair::even(),
            heavy_weights: WeightPair::heavy_iops(),
            heavy_iops_clients: BTreeSet::new(),
            heavy_iops_threshold: 4000.0,
            normalize_shares: false,
        }
    }
}

impl AllocationPolicy {
    /// Storage-only allocation of `total_monthly_cost`
    pub fn pure_size(total_monthly_cost: f64) -> Self {
        Self {
            total_monthly_cost,
            ..Default::default()
        }
    }

    /// Blended allocation of `total_monthly_cost`
    pub fn blended(total_monthly_cost: f64) -> Self {
        Self {
            total_monthly_cost,
            mode: AllocationMode::Blended,
            ..Default::default()
        }
    }

    /// Add clients to the heavy-IOPS allow-list
    pub fn with_heavy_clients<I, S>(mut self, clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.heavy_iops_clients
            .extend(clients.into_iter().map(|c| normalize_client(c.as_ref())));
        self
    }

    /// Rewrite every allow-listed name as a client merge key
    pub fn canonicalized(mut self) -> Self {
        let clients = std::mem::take(&mut self.heavy_iops_clients);
        self.with_heavy_clients(clients)
    }

    /// Check if a client gets the heavy-IOPS weights
    pub fn is_heavy_iops(&self, record: &ClientUsageRecord) -> bool {
        self.heavy_iops_clients.contains(&record.client)
            || record.total_iops() >= self.heavy_iops_threshold
    }

    /// Weights applied to a client under the blended policy
    pub fn weights_for(&self, record: &ClientUsageRecord) -> WeightPair {
        if self.is_heavy_iops(record) {
            self.heavy_weights
        } else {
            self.default_weights
        }
    }

    /// Check costs, thresholds and weight pairs
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("totalMonthlyCost", self.total_monthly_cost),
            ("heavyIopsThreshold", self.heavy_iops_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        self.default_weights.validate("defaultWeights")?;
        self.heavy_weights.validate("heavyWeights")?;
        Ok(())
    }
}

// =============================================================================
// Allocation Result
// =============================================================================

/// One client's portion of the cluster cost (full precision)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAllocation {
    pub record: ClientUsageRecord,
    pub data_share: f64,
    pub iops_share: f64,
    pub weighted_share: f64,
    pub monthly_cost: f64,
    /// Weights applied; `None` under the pure-size policy
    pub weights: Option<WeightPair>,
}

/// Cluster-wide figures for one allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub mode: AllocationMode,
    pub clients: usize,
    pub total_data_gb: f64,
    pub total_iops: f64,
    pub total_monthly_cost: f64,
    /// Sum of weighted shares across clients
    pub share_sum: f64,
    /// Sum of client monthly costs
    pub allocated_cost: f64,
    /// Cost not assigned to any client
    pub unallocated_cost: f64,
    pub normalized: bool,
}

/// Output of an allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub clients: Vec<ClientAllocation>,
    pub summary: AllocationSummary,
    pub notices: Vec<SizingNotice>,
}

// =============================================================================
// Proportional Allocator
// =============================================================================

/// Computes each client's share of the cluster cost
#[derive(Debug, Clone, Default)]
pub struct ProportionalAllocator {
    policy: AllocationPolicy,
}

impl ProportionalAllocator {
    /// Create an allocator with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator with a custom policy
    pub fn with_policy(policy: AllocationPolicy) -> Self {
        Self {
            policy: policy.canonicalized(),
        }
    }

    /// Active policy
    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Allocate the configured total cost across the dataset
    pub fn allocate(&self, dataset: &ClientDataset) -> Allocation {
        let total_data_gb = dataset.total_data_gb();
        let total_iops = dataset.total_iops();

        let mut notices = Vec::new();
        let data_entries: Vec<[f64; 1]> = dataset.iter().map(|r| [r.data_gb]).collect();
        let data_shares = proportions(&data_entries, ShareDimension::Data, &mut notices);

        // Throughput only shapes the weighted share under the blended policy
        let mut iops_notices = Vec::new();
        let iops_entries: Vec<[f64; 2]> = dataset
            .iter()
            .map(|r| [r.avg_read_ops_s, r.avg_write_ops_s])
            .collect();
        let iops_shares = proportions(&iops_entries, ShareDimension::Iops, &mut iops_notices);
        if self.policy.mode == AllocationMode::Blended {
            notices.extend(iops_notices);
        }

        let mut clients: Vec<ClientAllocation> = dataset
            .iter()
            .zip(data_shares.into_iter().zip(iops_shares))
            .map(|(record, (data_share, iops_share))| {
                let (weighted_share, weights) = match self.policy.mode {
                    AllocationMode::PureSize => (data_share, None),
                    AllocationMode::Blended => {
                        let weights = self.policy.weights_for(record);
                        (weights.blend(data_share, iops_share), Some(weights))
                    }
                };

                ClientAllocation {
                    record: record.clone(),
                    data_share,
                    iops_share,
                    weighted_share,
                    monthly_cost: 0.0,
                    weights,
                }
            })
            .collect();

        let normalized = self.policy.normalize_shares && !clients.is_empty();
        if normalized {
            normalize(&mut clients);
        }

        for client in &mut clients {
            client.monthly_cost = client.weighted_share * self.policy.total_monthly_cost;
        }

        let share_sum: f64 = clients.iter().map(|c| c.weighted_share).sum();
        let allocated_cost: f64 = clients.iter().map(|c| c.monthly_cost).sum();
        let summary = AllocationSummary {
            mode: self.policy.mode,
            clients: clients.len(),
            total_data_gb,
            total_iops,
            total_monthly_cost: self.policy.total_monthly_cost,
            share_sum,
            allocated_cost,
            unallocated_cost: self.policy.total_monthly_cost - allocated_cost,
            normalized,
        };

        if !clients.is_empty() && (share_sum - 1.0).abs() > 1e-6 {
            warn!(
                share_sum,
                unallocated = summary.unallocated_cost,
                mode = %self.policy.mode,
                "Weighted shares do not sum to 1; part of the cluster cost is unallocated"
            );
        }
        debug!(
            clients = summary.clients,
            total_data_gb, total_iops, "Allocated cluster cost"
        );

        Allocation {
            clients,
            summary,
            notices,
        }
    }
}

fn guard_zero(total: f64) -> f64 {
    if total == 0.0 {
        ZERO_TOTAL_EPSILON
    } else {
        total
    }
}

/// Each entry's fraction of the column total. An entry holds the additive
/// parts of one client's reading (storage, or read plus write rates).
fn proportions<const N: usize>(
    entries: &[[f64; N]],
    dimension: ShareDimension,
    notices: &mut Vec<SizingNotice>,
) -> Vec<f64> {
    let sums: Vec<f64> = entries.iter().map(|parts| parts.iter().sum::<f64>()).collect();
    let total: f64 = sums.iter().sum();

    if total.is_finite() {
        if total == 0.0 && !entries.is_empty() {
            notices.push(SizingNotice::ZeroTotal { dimension });
        }
        let denominator = guard_zero(total);
        return sums.iter().map(|value| value / denominator).collect();
    }

    // Dividing by the largest part first keeps every sum in range
    notices.push(SizingNotice::RescaledTotal { dimension });
    let finite = |v: &&f64| v.is_finite();
    let scale = entries
        .iter()
        .flatten()
        .filter(finite)
        .fold(0.0_f64, |max, v| max.max(*v));
    if scale <= 0.0 {
        return vec![0.0; entries.len()];
    }

    let scaled: Vec<f64> = entries
        .iter()
        .map(|parts| parts.iter().filter(finite).map(|v| v / scale).sum::<f64>())
        .collect();
    let denominator = guard_zero(scaled.iter().sum());
    scaled.iter().map(|value| value / denominator).collect()
}

/// Rescale weighted shares to sum to 1; an all-zero set splits evenly
fn normalize(clients: &mut [ClientAllocation]) {
    let sum: f64 = clients.iter().map(|c| c.weighted_share).sum();
    if sum > 0.0 {
        for client in clients.iter_mut() {
            client.weighted_share /= sum;
        }
    } else {
        let even = 1.0 / clients.len() as f64;
        for client in clients.iter_mut() {
            client.weighted_share = even;
        }
    }
}
