//! Report Module
//!
//! Tier-recommendation and proportional-allocation output views, with the
//! column order and rounding downstream spreadsheets expect.

pub mod render;
pub mod rows;

pub use render::*;
pub use rows::*;
