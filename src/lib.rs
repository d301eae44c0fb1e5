//! Capacity Sizer
//!
//! Turns a raw, copy-pasted usage export from a shared database cluster into
//! per-client sizing decisions: a workload classification and tier
//! recommendation for every client, and a proportional split of the cluster's
//! monthly cost.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                 CLI (tiers / allocate / policy)  │  REST API       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                          Sizing Engine                           │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌─────────────────────┐ │
//! │  │  Classifier  │  │ Tier Recommender │  │ Proportional        │ │
//! │  │              │  │  (cascade)       │  │ Allocator           │ │
//! │  └──────────────┘  └──────────────────┘  └─────────────────────┘ │
//! ├──────────────────────────────────────────────────────────────────┤
//! │        Ingest: value normalizer → record assembler → dataset     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                 Report: CSV / JSON row views                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ingest`]: Value normalization and record assembly
//! - [`sizing`]: Classification, tier cascade, cost allocation, policy
//! - [`report`]: Output rows and CSV/JSON rendering
//! - [`api`]: REST service
//! - [`metrics`]: Prometheus counters
//! - [`error`]: Error types and handling

pub mod api;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod report;
pub mod sizing;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig, RestRouter};

pub use error::{Error, Result};

pub use ingest::{
    AssemblerOptions, Assembly, ClientDataset, ClientUsageRecord, IngestStats, IngestWarning,
    RecordAssembler,
};

pub use metrics::SizingMetrics;

pub use report::{AllocationReport, OutputFormat, TierReport};

pub use sizing::{
    Allocation, AllocationMode, AllocationPolicy, ClassifierConfig, ProportionalAllocator,
    SizingEngine, SizingNotice, SizingPolicy, TierPolicy, TierRecommender, WorkloadClass,
    WorkloadClassifier,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
