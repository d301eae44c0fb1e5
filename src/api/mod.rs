//! Sizing API
//!
//! Stateless REST front end for the sizing engine.

pub mod rest;
pub mod server;

pub use rest::{AllocationSizingRequest, ApiErrorResponse, RestRouter, TierSizingRequest};
pub use server::{ApiServer, ApiServerConfig, DEFAULT_API_ADDR};
