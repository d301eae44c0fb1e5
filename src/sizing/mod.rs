//! Sizing Module
//!
//! Workload classification, tier recommendation and proportional cost
//! allocation over a normalized client dataset.

pub mod allocator;
pub mod classifier;
pub mod engine;
pub mod notice;
pub mod policy;
pub mod tier;

pub use allocator::*;
pub use classifier::*;
pub use engine::*;
pub use notice::*;
pub use policy::*;
pub use tier::*;
