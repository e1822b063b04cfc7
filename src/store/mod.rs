//! Durable JSON datasets.
//!
//! [`MonthlyDataset`] accumulates per-neighbor monthly records across runs
//! with full-period upserts; [`write_daily`] replaces the daily dataset with
//! the latest month only. Every write goes through a temp file and a rename.

pub mod atomic;
pub mod daily;
pub mod dataset;
pub mod records;
pub mod sanitize;

use std::path::PathBuf;

pub use daily::write_daily;
pub use dataset::MonthlyDataset;

pub const MONTHLY_FILE_NAME: &str = "crossborder_flows_monthly.json";
pub const DAILY_FILE_NAME: &str = "crossborder_flows_daily.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("refusing to write an empty dataset to {}", path.display())]
    EmptyDataset { path: PathBuf },
}
