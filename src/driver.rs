//! Incremental refresh: decides which months to (re)fetch and runs them
//! through the snapshot builder and the dataset store, oldest first.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::neighbors::NeighborConfig;
use crate::period::Month;
use crate::services::flow_source::FlowSource;
use crate::snapshot::builder::build_snapshot;
use crate::store::{DAILY_FILE_NAME, MONTHLY_FILE_NAME, MonthlyDataset, write_daily};

/// Upper bound on a backfill request, to bound total API load.
pub const MAX_BACKFILL_MONTHS: u32 = 24;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Newest month of the batch.
    pub target: Month,
    pub backfill: u32,
    pub force: bool,
}

impl RunOptions {
    pub fn monthly_path(&self) -> PathBuf {
        self.output_dir.join(MONTHLY_FILE_NAME)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.output_dir.join(DAILY_FILE_NAME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPlan {
    pub month: Month,
    pub fetch: bool,
    pub newest: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: Vec<Month>,
    pub skipped: Vec<Month>,
    pub daily_written: bool,
}

/// Caps `requested` at [`MAX_BACKFILL_MONTHS`], warning when it had to.
pub fn clamp_backfill(requested: u32) -> u32 {
    if requested > MAX_BACKFILL_MONTHS {
        warn!(
            requested,
            max = MAX_BACKFILL_MONTHS,
            "Backfill request exceeds limit, capping"
        );
        MAX_BACKFILL_MONTHS
    } else {
        requested
    }
}

/// A month is skipped only when it is already stored, not forced, and not
/// the newest month of the batch. The newest month is always refetched so
/// late upstream corrections land.
pub fn plan_months(months: &[Month], dataset: &MonthlyDataset, force: bool) -> Vec<MonthPlan> {
    let newest = months.iter().max().copied();
    months
        .iter()
        .map(|&month| {
            let newest = Some(month) == newest;
            let present = dataset.contains_period(&month.to_string());
            MonthPlan {
                month,
                fetch: force || newest || !present,
                newest,
            }
        })
        .collect()
}

/// Runs one refresh. Each fetched month is persisted before the next one is
/// requested, so a later failure leaves earlier months durable.
#[tracing::instrument(
    skip_all,
    fields(target = %options.target, backfill = options.backfill, force = options.force)
)]
pub async fn run<S: FlowSource + ?Sized>(
    source: &S,
    config: &NeighborConfig,
    options: &RunOptions,
) -> Result<RunSummary> {
    let count = clamp_backfill(options.backfill);
    let months = Month::batch_ending_at(options.target, count);

    let mut summary = RunSummary::default();
    if months.is_empty() {
        info!("Nothing to fetch");
        return Ok(summary);
    }

    let monthly_path = options.monthly_path();
    let mut dataset = MonthlyDataset::load(&monthly_path, config);

    for plan in plan_months(&months, &dataset, options.force) {
        if !plan.fetch {
            info!(month = %plan.month, "Already stored, skipping");
            summary.skipped.push(plan.month);
            continue;
        }

        info!(month = %plan.month, newest = plan.newest, "Fetching month");
        let bundle = build_snapshot(source, config, plan.month).await?;

        dataset.upsert(&bundle.snapshot);
        dataset.write(&monthly_path, config)?;
        summary.fetched.push(plan.month);

        if plan.newest {
            write_daily(&options.daily_path(), plan.month, &bundle.daily)?;
            summary.daily_written = true;
        }
    }

    info!(
        fetched = summary.fetched.len(),
        skipped = summary.skipped.len(),
        daily_written = summary.daily_written,
        "Run complete"
    );
    Ok(summary)
}
