use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::info;

use crate::period::Month;
use crate::snapshot::types::DailyAggregate;
use crate::snapshot::utility::round2;
use crate::store::StoreError;
use crate::store::atomic::write_json_atomic;
use crate::store::dataset::generated_at;
use crate::store::records::{Dataset, DailyRecord, DatasetMeta, SOURCE, TimeSummary, flow_fields};

/// Overwrites the daily dataset with exactly `month`'s days. Nothing from a
/// previous file is carried over.
///
/// # Errors
///
/// [`StoreError::EmptyDataset`] when `days` is empty; the existing file is
/// not touched.
pub fn write_daily(path: &Path, month: Month, days: &[DailyAggregate]) -> Result<()> {
    if days.is_empty() {
        return Err(StoreError::EmptyDataset {
            path: PathBuf::from(path),
        }
        .into());
    }

    let records: Vec<DailyRecord> = days
        .iter()
        .map(|day| DailyRecord {
            period: day.date.format("%Y-%m-%d").to_string(),
            import: round2(day.imports),
            export: round2(day.exports),
            net: round2(day.net),
        })
        .collect();

    let time = TimeSummary::from_sorted("daily", records.iter().map(|r| r.period.as_str()))
        .ok_or_else(|| anyhow!("daily dataset has no periods"))?;

    let meta = DatasetMeta {
        id: "entsoe_crossborder_flows_daily",
        title: "Cross-border physical flows, daily totals (latest month)",
        generated_at: generated_at(),
        month: Some(month.to_string()),
        time,
        fields: flow_fields(),
        dimensions: BTreeMap::new(),
        source: SOURCE,
    };

    write_json_atomic(
        path,
        &Dataset {
            meta,
            records: &records,
        },
    )?;

    info!(path = %path.display(), month = %month, days = records.len(), "Daily dataset written");
    Ok(())
}
