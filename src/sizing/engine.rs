//! Sizing Engine
//!
//! Owns a validated policy and runs the two cost modes over a dataset. Both
//! modes read the same immutable dataset and are independent of each other.

use super::allocator::{Allocation, AllocationPolicy, ProportionalAllocator};
use super::classifier::{WorkloadClass, WorkloadClassifier};
use super::notice::SizingNotice;
use super::policy::SizingPolicy;
use super::tier::TierRecommender;
use crate::error::Result;
use crate::ingest::{
    AssemblerOptions, Assembly, ClientDataset, ClientUsageRecord, IngestStats, IngestWarning,
    RecordAssembler,
};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

// =============================================================================
// Tier Recommendation
// =============================================================================

/// Tier-mode view of one client (full precision)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRecommendation {
    pub record: ClientUsageRecord,
    pub classification: WorkloadClass,
    pub tier: String,
    pub monthly_cost: f64,
}

/// Result of a tier-mode run over raw text
#[derive(Debug, Clone)]
pub struct TierRun {
    pub recommendations: Vec<TierRecommendation>,
    pub notices: Vec<SizingNotice>,
    pub stats: IngestStats,
    pub warnings: Vec<IngestWarning>,
}

/// Result of an allocation-mode run over raw text
#[derive(Debug, Clone)]
pub struct AllocationRun {
    pub allocation: Allocation,
    pub notices: Vec<SizingNotice>,
    pub stats: IngestStats,
    pub warnings: Vec<IngestWarning>,
}

// =============================================================================
// Sizing Engine
// =============================================================================

/// Capacity sizing and cost allocation engine
#[derive(Debug, Clone)]
pub struct SizingEngine {
    policy: SizingPolicy,
    classifier: WorkloadClassifier,
    recommender: TierRecommender,
    allocator: ProportionalAllocator,
}

impl Default for SizingEngine {
    fn default() -> Self {
        Self::from_parts(SizingPolicy::default())
    }
}

impl SizingEngine {
    /// Create an engine after validating the policy
    pub fn new(mut policy: SizingPolicy) -> Result<Self> {
        policy.canonicalize();
        policy.validate()?;
        Ok(Self::from_parts(policy))
    }

    fn from_parts(policy: SizingPolicy) -> Self {
        Self {
            classifier: WorkloadClassifier::with_config(policy.classifier.clone()),
            recommender: TierRecommender::with_policy(policy.tiers.clone()),
            allocator: ProportionalAllocator::with_policy(policy.allocation.clone()),
            policy,
        }
    }

    /// Copy of this engine with a different allocation policy
    pub fn with_allocation(&self, allocation: AllocationPolicy) -> Result<Self> {
        Self::new(SizingPolicy {
            allocation,
            ..self.policy.clone()
        })
    }

    /// Active policy
    pub fn policy(&self) -> &SizingPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &WorkloadClassifier {
        &self.classifier
    }

    pub fn recommender(&self) -> &TierRecommender {
        &self.recommender
    }

    pub fn allocator(&self) -> &ProportionalAllocator {
        &self.allocator
    }

    /// Assemble raw export text into a dataset
    pub fn ingest(&self, text: &str, options: AssemblerOptions) -> Assembly {
        RecordAssembler::assemble_text(text, options)
    }

    /// Classify and size every client
    pub fn recommend_tiers(&self, dataset: &ClientDataset) -> Vec<TierRecommendation> {
        dataset
            .iter()
            .map(|record| {
                let tier = self.recommender.recommend_for(record);
                TierRecommendation {
                    record: record.clone(),
                    classification: self.classifier.classify_record(record),
                    tier: tier.to_string(),
                    monthly_cost: self.recommender.tier_monthly_cost(tier),
                }
            })
            .collect()
    }

    /// One notice per recommended tier priced at the fallback cost
    pub fn fallback_cost_notices(
        &self,
        recommendations: &[TierRecommendation],
    ) -> Vec<SizingNotice> {
        let mut unpriced: IndexMap<&str, usize> = IndexMap::new();
        for rec in recommendations {
            if !self.recommender.has_cost(&rec.tier) {
                *unpriced.entry(rec.tier.as_str()).or_default() += 1;
            }
        }

        unpriced
            .into_iter()
            .map(|(tier, clients)| SizingNotice::FallbackCost {
                tier: tier.to_string(),
                cost: self.recommender.tier_monthly_cost(tier),
                clients,
            })
            .collect()
    }

    /// Split the cluster cost across every client
    pub fn allocate(&self, dataset: &ClientDataset) -> Allocation {
        self.allocator.allocate(dataset)
    }

    /// Text in, tier recommendations out
    pub fn run_tiers(&self, text: &str, options: AssemblerOptions) -> TierRun {
        let assembly = self.ingest(text, options);
        let recommendations = self.recommend_tiers(&assembly.dataset);
        let notices = self.fallback_cost_notices(&recommendations);
        log_notices(&notices, options.strict);
        info!(
            clients = recommendations.len(),
            dropped_rows = assembly.stats.dropped_rows,
            "Tier recommendation complete"
        );

        TierRun {
            recommendations,
            notices,
            stats: assembly.stats,
            warnings: assembly.warnings,
        }
    }

    /// Text in, cost allocation out
    pub fn run_allocation(&self, text: &str, options: AssemblerOptions) -> AllocationRun {
        let assembly = self.ingest(text, options);
        let allocation = self.allocate(&assembly.dataset);
        let notices = allocation.notices.clone();
        log_notices(&notices, options.strict);
        info!(
            clients = allocation.clients.len(),
            mode = %allocation.summary.mode,
            allocated_cost = allocation.summary.allocated_cost,
            "Cost allocation complete"
        );

        AllocationRun {
            allocation,
            notices,
            stats: assembly.stats,
            warnings: assembly.warnings,
        }
    }
}

fn log_notices(notices: &[SizingNotice], strict: bool) {
    for notice in notices {
        if strict {
            warn!(?notice, "{}", notice);
        } else {
            debug!(?notice, "{}", notice);
        }
    }
}
