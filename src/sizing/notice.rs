//! Sizing notices
//!
//! Conditions the sizing stage recovered from on its own. Ingest warnings
//! point at a line; these describe the dataset as a whole.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension a share is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShareDimension {
    Data,
    Iops,
}

impl fmt::Display for ShareDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareDimension::Data => write!(f, "data"),
            ShareDimension::Iops => write!(f, "iops"),
        }
    }
}

/// Recovered condition found while sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SizingNotice {
    /// Every client reported zero; all shares of this dimension are zero
    ZeroTotal { dimension: ShareDimension },
    /// Raw total overflowed; shares were computed on rescaled readings
    RescaledTotal { dimension: ShareDimension },
    /// Recommended tier is missing from the cost table
    FallbackCost {
        tier: String,
        cost: f64,
        clients: usize,
    },
}

impl fmt::Display for SizingNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingNotice::ZeroTotal { dimension } => {
                write!(f, "total {} is zero; {} shares are all zero", dimension, dimension)
            }
            SizingNotice::RescaledTotal { dimension } => {
                write!(f, "total {} overflowed; shares computed on rescaled readings", dimension)
            }
            SizingNotice::FallbackCost {
                tier,
                cost,
                clients,
            } => write!(
                f,
                "tier {} has no cost entry; {} client(s) priced at fallback {}",
                tier, clients, cost
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_json_shape() {
        let notice = SizingNotice::ZeroTotal {
            dimension: ShareDimension::Iops,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "zeroTotal");
        assert_eq!(json["dimension"], "iops");

        let notice = SizingNotice::FallbackCost {
            tier: "M400".into(),
            cost: 2000.0,
            clients: 2,
        };
        assert_eq!(
            notice.to_string(),
            "tier M400 has no cost entry; 2 client(s) priced at fallback 2000"
        );
    }
}
