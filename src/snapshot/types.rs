//! Data types produced by parsing and aggregation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One physical reading converted to energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySample {
    pub timestamp: DateTime<Utc>,
    pub energy_mwh: f64,
}

/// Everything parsed from one directional response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowVolume {
    pub energy_mwh: f64,
    pub has_data: bool,
    /// Ascending by timestamp.
    pub samples: Vec<EnergySample>,
}

impl FlowVolume {
    /// The valid "nothing published" result.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Flow over one interconnection for a month, from the home area's side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborFlow {
    pub code: String,
    pub label: String,
    /// Dataset key (slug) this neighbor is stored under.
    pub key: String,
    pub import_mwh: f64,
    pub export_mwh: f64,
    pub net_mwh: f64,
    pub has_data: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FlowTotals {
    pub import_mwh: f64,
    pub export_mwh: f64,
    pub net_mwh: f64,
}

/// One month aggregated across every configured neighbor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySnapshot {
    /// `YYYY-MM`
    pub id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Descending by `net_mwh`.
    pub neighbors: Vec<NeighborFlow>,
    pub totals: FlowTotals,
}

/// Imports and exports summed per UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub imports: f64,
    pub exports: f64,
    pub net: f64,
}

/// A snapshot together with the daily series derived from the same samples.
#[derive(Debug, Clone)]
pub struct SnapshotBundle {
    pub snapshot: MonthlySnapshot,
    pub daily: Vec<DailyAggregate>,
}
