use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::neighbors::NeighborConfig;
use crate::snapshot::types::MonthlySnapshot;
use crate::snapshot::utility::round2;
use crate::store::StoreError;
use crate::store::atomic::write_json_atomic;
use crate::store::records::{
    Dataset, DatasetMeta, DimensionOption, MonthlyRecord, SOURCE, TimeSummary, flow_fields,
};
use crate::store::sanitize::sanitize_monthly;

#[derive(Deserialize)]
struct StoredDataset {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// The monthly per-neighbor dataset, held in memory for one run.
#[derive(Debug, Default)]
pub struct MonthlyDataset {
    records: Vec<MonthlyRecord>,
}

impl MonthlyDataset {
    pub fn from_records(records: Vec<MonthlyRecord>) -> Self {
        Self { records }
    }

    /// Reads and sanitizes the dataset at `path`. A missing or unreadable
    /// file starts an empty dataset rather than failing the run.
    ///
    /// When several records share a `(period, neighbor)` after sanitizing,
    /// the last one in the file wins.
    pub fn load(path: &Path, config: &NeighborConfig) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                info!(
                    path = %path.display(),
                    error = %e,
                    "No existing monthly dataset, starting empty"
                );
                return Self::default();
            }
        };

        let stored: StoredDataset = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Monthly dataset unreadable, starting empty"
                );
                return Self::default();
            }
        };

        let total = stored.records.len();
        let sanitized: Vec<MonthlyRecord> = stored
            .records
            .iter()
            .filter_map(|value| sanitize_monthly(value, config))
            .collect();
        if sanitized.len() < total {
            warn!(
                dropped = total - sanitized.len(),
                "Dropped records missing period or neighbor"
            );
        }

        let sanitized_count = sanitized.len();
        let records = keep_last_per_key(sanitized);
        if records.len() < sanitized_count {
            warn!(
                dropped = sanitized_count - records.len(),
                "Collapsed records sharing a period and neighbor"
            );
        }
        debug!(records = records.len(), "Monthly dataset loaded");

        Self { records }
    }

    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn contains_period(&self, period: &str) -> bool {
        self.records.iter().any(|r| r.period == period)
    }

    /// Replaces every record of the snapshot's period with one record per
    /// neighbor in the snapshot. Other periods are left as they are.
    pub fn upsert(&mut self, snapshot: &MonthlySnapshot) {
        let before = self.records.len();
        self.records.retain(|r| r.period != snapshot.id);
        let removed = before - self.records.len();

        self.records
            .extend(snapshot.neighbors.iter().map(|n| MonthlyRecord {
                period: snapshot.id.clone(),
                neighbor: n.key.clone(),
                import: round2(n.import_mwh),
                export: round2(n.export_mwh),
                net: round2(n.net_mwh),
                has_data: n.has_data,
            }));

        debug!(
            period = %snapshot.id,
            removed,
            added = snapshot.neighbors.len(),
            "Period upserted"
        );
    }

    /// Sorts by `(period, neighbor)` and atomically replaces `path`.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyDataset`] if there is nothing to write; the file on
    /// disk is left untouched in that case.
    pub fn write(&mut self, path: &Path, config: &NeighborConfig) -> Result<()> {
        if self.records.is_empty() {
            return Err(StoreError::EmptyDataset {
                path: PathBuf::from(path),
            }
            .into());
        }

        self.records.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then_with(|| a.neighbor.cmp(&b.neighbor))
        });

        let meta = self.meta(config)?;
        write_json_atomic(
            path,
            &Dataset {
                meta,
                records: &self.records,
            },
        )?;

        info!(path = %path.display(), records = self.records.len(), "Monthly dataset written");
        Ok(())
    }

    /// Recomputed from the records, never carried over from a snapshot.
    fn meta(&self, config: &NeighborConfig) -> Result<DatasetMeta> {
        let periods = self.records.iter().map(|r| r.period.as_str());
        let time = TimeSummary::from_sorted("monthly", periods)
            .ok_or_else(|| anyhow::anyhow!("monthly dataset has no periods"))?;

        let mut keys: Vec<&str> = self.records.iter().map(|r| r.neighbor.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        let options = keys
            .into_iter()
            .map(|key| DimensionOption {
                key: key.to_string(),
                label: config.label_for_key(key).unwrap_or(key).to_string(),
            })
            .collect();

        Ok(DatasetMeta {
            id: "entsoe_crossborder_flows_monthly",
            title: "Cross-border physical flows by interconnection (monthly)",
            generated_at: generated_at(),
            month: None,
            time,
            fields: flow_fields(),
            dimensions: BTreeMap::from([("neighbor", options)]),
            source: SOURCE,
        })
    }
}

fn keep_last_per_key(records: Vec<MonthlyRecord>) -> Vec<MonthlyRecord> {
    let mut seen = HashSet::new();
    let mut kept: Vec<MonthlyRecord> = records
        .into_iter()
        .rev()
        .filter(|r| seen.insert((r.period.clone(), r.neighbor.clone())))
        .collect();
    kept.reverse();
    kept
}

/// UTC, second precision, `Z` suffix.
pub fn generated_at() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
