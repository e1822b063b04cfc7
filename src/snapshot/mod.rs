//! Monthly aggregation across all configured interconnections.
//!
//! The builder drives the flow source neighbor by neighbor, sums each
//! direction into per-neighbor totals, and groups every sample into a
//! per-day series for the daily dataset.

pub mod builder;
pub mod daily;
pub mod types;
pub mod utility;
