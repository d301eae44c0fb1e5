//! Tier Recommender
//!
//! Maps a client's (storage, throughput) pair onto a discrete capacity tier
//! with a flat monthly cost. Rules are checked from the largest tier down and
//! the first match wins. Each rule fires when *either* dimension reaches its
//! threshold, so a client is sized by whichever dimension asks for more.

use crate::error::{Error, Result};
use crate::ingest::ClientUsageRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Default Tier Table
// =============================================================================

/// Largest tier
pub const TIER_M200: &str = "M200";
/// Second tier
pub const TIER_M100: &str = "M100";
/// Third tier
pub const TIER_M50: &str = "M50";
/// Smallest tier, used when no rule matches
pub const TIER_M30: &str = "M30";

/// Cost used for a tier name missing from the cost table (USD/month)
pub const DEFAULT_FALLBACK_MONTHLY_COST: f64 = 2000.0;

// =============================================================================
// Tier Rules
// =============================================================================

/// One step of the cascade; both thresholds inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRule {
    /// Tier selected when the rule fires
    pub tier: String,
    /// Storage at or above this selects the tier (GB)
    pub min_data_gb: f64,
    /// Throughput at or above this selects the tier (ops/s)
    pub min_iops: f64,
}

impl TierRule {
    pub fn new(tier: impl Into<String>, min_data_gb: f64, min_iops: f64) -> Self {
        Self {
            tier: tier.into(),
            min_data_gb,
            min_iops,
        }
    }

    /// Check if either dimension reaches this rule
    pub fn matches(&self, data_gb: f64, total_iops: f64) -> bool {
        data_gb >= self.min_data_gb || total_iops >= self.min_iops
    }
}

// =============================================================================
// Tier Policy
// =============================================================================

/// Tier cascade and cost table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierPolicy {
    /// Rules from largest to smallest tier
    pub cascade: Vec<TierRule>,
    /// Tier selected when no rule matches
    pub base_tier: String,
    /// Flat monthly cost per tier (USD)
    pub monthly_costs: IndexMap<String, f64>,
    /// Cost for a tier missing from `monthly_costs` (USD)
    pub fallback_monthly_cost: f64,
}

impl Default for TierPolicy {
    fn default() -> Self {
        let monthly_costs = [
            (TIER_M30, 1500.0),
            (TIER_M50, 3000.0),
            (TIER_M100, 5000.0),
            (TIER_M200, 8000.0),
        ]
        .into_iter()
        .map(|(tier, cost)| (tier.to_string(), cost))
        .collect();

        Self {
            cascade: vec![
                TierRule::new(TIER_M200, 5000.0, 15000.0),
                TierRule::new(TIER_M100, 2000.0, 8000.0),
                TierRule::new(TIER_M50, 500.0, 2000.0),
            ],
            base_tier: TIER_M30.to_string(),
            monthly_costs,
            fallback_monthly_cost: DEFAULT_FALLBACK_MONTHLY_COST,
        }
    }
}

impl TierPolicy {
    /// Check thresholds and costs, and that the cascade runs largest first
    pub fn validate(&self) -> Result<()> {
        for (index, rule) in self.cascade.iter().enumerate() {
            check_threshold(&format!("cascade[{index}].minDataGb"), rule.min_data_gb)?;
            check_threshold(&format!("cascade[{index}].minIops"), rule.min_iops)?;

            if let Some(previous) = index.checked_sub(1).map(|i| &self.cascade[i]) {
                if rule.min_data_gb > previous.min_data_gb || rule.min_iops > previous.min_iops {
                    return Err(Error::TierCascadeOrder {
                        index,
                        tier: rule.tier.clone(),
                    });
                }
            }
        }

        for (tier, cost) in &self.monthly_costs {
            check_threshold(&format!("monthlyCosts.{tier}"), *cost)?;
        }
        check_threshold("fallbackMonthlyCost", self.fallback_monthly_cost)?;

        if self.base_tier.trim().is_empty() {
            return Err(Error::Configuration("baseTier must not be empty".into()));
        }

        Ok(())
    }
}

fn check_threshold(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold {
            name: name.to_string(),
            value,
        })
    }
}

// =============================================================================
// Tier Recommender
// =============================================================================

/// Recommends a capacity tier and its monthly cost
#[derive(Debug, Clone, Default)]
pub struct TierRecommender {
    policy: TierPolicy,
}

impl TierRecommender {
    /// Create a recommender with the default tier table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recommender with a custom tier table
    pub fn with_policy(policy: TierPolicy) -> Self {
        Self { policy }
    }

    /// Select the tier for a (storage, throughput) pair
    pub fn recommend_tier(&self, data_gb: f64, total_iops: f64) -> &str {
        self.policy
            .cascade
            .iter()
            .find(|rule| rule.matches(data_gb, total_iops))
            .map(|rule| rule.tier.as_str())
            .unwrap_or(self.policy.base_tier.as_str())
    }

    /// Select the tier for a client record
    pub fn recommend_for(&self, record: &ClientUsageRecord) -> &str {
        self.recommend_tier(record.data_gb, record.total_iops())
    }

    /// Check if a tier has its own entry in the cost table
    pub fn has_cost(&self, tier: &str) -> bool {
        self.policy.monthly_costs.contains_key(tier)
    }

    /// Flat monthly cost for a tier, or the fallback cost for unknown names
    pub fn tier_monthly_cost(&self, tier: &str) -> f64 {
        self.policy
            .monthly_costs
            .get(tier)
            .copied()
            .unwrap_or(self.policy.fallback_monthly_cost)
    }

    /// Active tier table
    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cascade_boundaries() {
        let recommender = TierRecommender::new();

        assert_eq!(recommender.recommend_tier(0.0, 0.0), TIER_M30);
        assert_eq!(recommender.recommend_tier(499.99, 1999.99), TIER_M30);
        assert_eq!(recommender.recommend_tier(500.0, 0.0), TIER_M50);
        assert_eq!(recommender.recommend_tier(0.0, 2000.0), TIER_M50);
        assert_eq!(recommender.recommend_tier(2000.0, 0.0), TIER_M100);
        assert_eq!(recommender.recommend_tier(0.0, 8000.0), TIER_M100);
        assert_eq!(recommender.recommend_tier(5000.0, 0.0), TIER_M200);
        assert_eq!(recommender.recommend_tier(0.0, 15000.0), TIER_M200);
    }

    #[test]
    fn test_either_dimension_escalates() {
        let recommender = TierRecommender::new();

        // Small storage, huge throughput
        assert_eq!(recommender.recommend_tier(100.0, 16000.0), TIER_M200);
        // Storage says M100, throughput alone says M50: higher tier wins
        assert_eq!(recommender.recommend_tier(2500.0, 2500.0), TIER_M100);
        assert_eq!(recommender.recommend_tier(1228.8, 1000.0), TIER_M50);
    }

    #[test]
    fn test_monthly_costs() {
        let recommender = TierRecommender::new();

        assert_eq!(recommender.tier_monthly_cost(TIER_M30), 1500.0);
        assert_eq!(recommender.tier_monthly_cost(TIER_M50), 3000.0);
        assert_eq!(recommender.tier_monthly_cost(TIER_M100), 5000.0);
        assert_eq!(recommender.tier_monthly_cost(TIER_M200), 8000.0);
        assert_eq!(recommender.tier_monthly_cost("M400"), DEFAULT_FALLBACK_MONTHLY_COST);
        assert_eq!(recommender.tier_monthly_cost(""), DEFAULT_FALLBACK_MONTHLY_COST);
    }

    #[test]
    fn test_custom_policy_without_rules() {
        let recommender = TierRecommender::with_policy(TierPolicy {
            cascade: Vec::new(),
            base_tier: "shared".into(),
            monthly_costs: IndexMap::new(),
            fallback_monthly_cost: 99.0,
        });

        assert_eq!(recommender.recommend_tier(1e9, 1e9), "shared");
        assert_eq!(recommender.tier_monthly_cost("shared"), 99.0);
    }

    #[test]
    fn test_validate_default() {
        assert!(TierPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unordered_cascade() {
        let mut policy = TierPolicy::default();
        policy.cascade.swap(0, 1);

        assert_matches!(
            policy.validate(),
            Err(Error::TierCascadeOrder { index: 1, ref tier }) if tier == TIER_M200
        );
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        let mut policy = TierPolicy::default();
        policy.monthly_costs.insert(TIER_M50.into(), -1.0);

        assert_matches!(policy.validate(), Err(Error::InvalidThreshold { .. }));
    }
}
