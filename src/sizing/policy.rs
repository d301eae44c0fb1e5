//! Sizing Policy
//!
//! Every threshold, tier, cost and weight the engine applies, gathered into
//! one value. A policy is loaded (or defaulted), validated once, then handed
//! to the engine; nothing in the engine reads global settings.
//!
//! ```yaml
//! classifier:
//!   dataIntensiveGb: 1024
//!   iopsIntensiveOps: 4000
//! tiers:
//!   cascade:
//!     - { tier: M200, minDataGb: 5000, minIops: 15000 }
//!     - { tier: M100, minDataGb: 2000, minIops: 8000 }
//!     - { tier: M50, minDataGb: 500, minIops: 2000 }
//!   baseTier: M30
//!   monthlyCosts: { M30: 1500, M50: 3000, M100: 5000, M200: 8000 }
//!   fallbackMonthlyCost: 2000
//! allocation:
//!   totalMonthlyCost: 240000
//!   mode: blended
//!   heavyIopsClients: [acme]
//! ```

use super::allocator::AllocationPolicy;
use super::classifier::ClassifierConfig;
use super::tier::TierPolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Complete sizing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizingPolicy {
    pub classifier: ClassifierConfig,
    pub tiers: TierPolicy,
    pub allocation: AllocationPolicy,
}

impl SizingPolicy {
    /// Parse and validate a YAML policy
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut policy: SizingPolicy = serde_yaml::from_str(yaml)?;
        policy.canonicalize();
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a YAML policy file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read policy {}: {}", path.display(), e))
        })?;
        let policy = Self::from_yaml_str(&yaml)?;
        info!("Loaded sizing policy from {}", path.display());
        Ok(policy)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("classifier.dataIntensiveGb", self.classifier.data_intensive_gb),
            ("classifier.iopsIntensiveOps", self.classifier.iops_intensive_ops),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        self.tiers.validate()?;
        self.allocation.validate()
    }

    /// Normalize client names in the heavy-IOPS allow-list to merge keys
    pub(crate) fn canonicalize(&mut self) {
        self.allocation = std::mem::take(&mut self.allocation).canonicalized();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::allocator::AllocationMode;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(SizingPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let policy = SizingPolicy::from_yaml_str(
            "allocation:\n  mode: blended\n  heavyIopsClients: [\" AcmeHealth \"]\n",
        )
        .unwrap();

        assert_eq!(policy.allocation.mode, AllocationMode::Blended);
        assert!(policy.allocation.heavy_iops_clients.contains("acmehealth"));
        assert_eq!(policy.allocation.total_monthly_cost, 240_000.0);
        assert_eq!(policy.classifier, ClassifierConfig::default());
        assert_eq!(policy.tiers, TierPolicy::default());
    }

    #[test]
    fn test_yaml_round_trip() {
        let policy = SizingPolicy::default();
        let yaml = policy.to_yaml().unwrap();
        assert!(yaml.contains("dataIntensiveGb"));
        assert_eq!(SizingPolicy::from_yaml_str(&yaml).unwrap(), policy);
    }

    #[test]
    fn test_invalid_yaml_values() {
        assert_matches!(
            SizingPolicy::from_yaml_str("classifier:\n  dataIntensiveGb: -5\n"),
            Err(Error::InvalidThreshold { .. })
        );
        assert_matches!(
            SizingPolicy::from_yaml_str("allocation:\n  defaultWeights: { data: 0.9, iops: 0.9 }\n"),
            Err(Error::InvalidWeights { .. })
        );
        assert_matches!(
            SizingPolicy::from_yaml_str("allocation:\n  mode: weighted\n"),
            Err(Error::Yaml(_))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "allocation:\n  totalMonthlyCost: 1000").unwrap();

        let policy = SizingPolicy::load(file.path()).unwrap();
        assert_eq!(policy.allocation.total_monthly_cost, 1000.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SizingPolicy::load("/nonexistent/policy.yaml").unwrap_err();
        assert!(err.is_configuration());
    }
}
