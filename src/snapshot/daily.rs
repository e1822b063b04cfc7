use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::snapshot::types::{DailyAggregate, EnergySample};

/// Which side of the ledger a batch of samples belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Import,
    Export,
}

/// Accumulates samples from any number of neighbor/direction fetches into
/// per-day import and export totals, keyed by the UTC calendar day.
#[derive(Debug, Default)]
pub struct DailyAccumulator {
    days: BTreeMap<NaiveDate, (f64, f64)>,
}

impl DailyAccumulator {
    pub fn add(&mut self, direction: Direction, samples: &[EnergySample]) {
        for sample in samples {
            let day = self.days.entry(sample.timestamp.date_naive()).or_default();
            match direction {
                Direction::Import => day.0 += sample.energy_mwh,
                Direction::Export => day.1 += sample.energy_mwh,
            }
        }
    }

    /// Ascending by date.
    pub fn finish(self) -> Vec<DailyAggregate> {
        self.days
            .into_iter()
            .map(|(date, (imports, exports))| DailyAggregate {
                date,
                imports,
                exports,
                net: imports - exports,
            })
            .collect()
    }
}
