//! Ingest Module
//!
//! Turns a free-form usage export into a normalized per-client dataset.

pub mod assembler;
pub mod normalize;
pub mod record;

pub use assembler::*;
pub use normalize::*;
pub use record::*;
