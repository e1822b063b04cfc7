use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::neighbors::NeighborConfig;
use crate::period::Month;
use crate::services::flow_source::FlowSource;
use crate::snapshot::daily::{DailyAccumulator, Direction};
use crate::snapshot::types::{FlowTotals, MonthlySnapshot, NeighborFlow, SnapshotBundle};

/// Fetches both directions for every configured neighbor and aggregates
/// them into a [`MonthlySnapshot`] plus its daily series.
///
/// Requests are issued one at a time, neighbor by neighbor, import before
/// export. The platform throttles aggressively and nothing here coordinates
/// concurrent callers, so this loop must stay sequential.
#[tracing::instrument(skip_all, fields(month = %month))]
pub async fn build_snapshot<S: FlowSource + ?Sized>(
    source: &S,
    config: &NeighborConfig,
    month: Month,
) -> Result<SnapshotBundle> {
    let home = config.home_domain();
    let mut daily = DailyAccumulator::default();
    let mut neighbors = Vec::with_capacity(config.neighbors().len());

    for neighbor in config.neighbors() {
        let import = source
            .fetch_flow(month, home, &neighbor.code)
            .await
            .with_context(|| format!("fetching imports from {} for {month}", neighbor.label))?;
        let export = source
            .fetch_flow(month, &neighbor.code, home)
            .await
            .with_context(|| format!("fetching exports to {} for {month}", neighbor.label))?;

        debug!(
            neighbor = %neighbor.label,
            import_samples = import.samples.len(),
            export_samples = export.samples.len(),
            "Neighbor fetched"
        );

        daily.add(Direction::Import, &import.samples);
        daily.add(Direction::Export, &export.samples);

        neighbors.push(NeighborFlow {
            code: neighbor.code.clone(),
            label: neighbor.label.clone(),
            key: neighbor.key(),
            import_mwh: import.energy_mwh,
            export_mwh: export.energy_mwh,
            net_mwh: import.energy_mwh - export.energy_mwh,
            has_data: import.has_data || export.has_data,
        });
    }

    neighbors.sort_by(|a, b| b.net_mwh.total_cmp(&a.net_mwh));

    let totals = neighbors.iter().fold(FlowTotals::default(), |acc, n| FlowTotals {
        import_mwh: acc.import_mwh + n.import_mwh,
        export_mwh: acc.export_mwh + n.export_mwh,
        net_mwh: acc.net_mwh + n.net_mwh,
    });

    info!(
        neighbors = neighbors.len(),
        import_mwh = totals.import_mwh,
        export_mwh = totals.export_mwh,
        net_mwh = totals.net_mwh,
        "Snapshot built"
    );

    Ok(SnapshotBundle {
        snapshot: MonthlySnapshot {
            id: month.to_string(),
            period_start: month.start(),
            period_end: month.end(),
            neighbors,
            totals,
        },
        daily: daily.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::{DEFAULT_HOME_DOMAIN, Neighbor};
    use crate::services::fake::FakeFlowSource;
    use crate::snapshot::types::{EnergySample, FlowVolume};
    use chrono::{TimeZone, Utc};

    const HOME: &str = DEFAULT_HOME_DOMAIN;
    const AL: &str = "10YAL-KESH-----5";
    const RS: &str = "10YCS-SERBIATSOV";
    const MK: &str = "10YMK-MEPSO----8";
    const ME: &str = "10YCS-CG-TSO---S";

    fn config() -> NeighborConfig {
        NeighborConfig::new(
            HOME,
            vec![Neighbor::new(AL, "Albania"), Neighbor::new(RS, "Serbia")],
        )
        .unwrap()
    }

    fn volume(day: u32, energy: f64) -> FlowVolume {
        FlowVolume {
            energy_mwh: energy,
            has_data: true,
            samples: vec![EnergySample {
                timestamp: Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap(),
                energy_mwh: energy,
            }],
        }
    }

    fn january() -> Month {
        "2024-01".parse().unwrap()
    }

    #[tokio::test]
    async fn test_sorted_descending_by_net() {
        // Albania nets -40, Serbia nets 120.
        let source = FakeFlowSource::default()
            .with(HOME, AL, volume(1, 10.0))
            .with(AL, HOME, volume(1, 50.0))
            .with(HOME, RS, volume(2, 150.0))
            .with(RS, HOME, volume(2, 30.0));

        let bundle = build_snapshot(&source, &config(), january()).await.unwrap();
        let snapshot = bundle.snapshot;

        assert_eq!(snapshot.id, "2024-01");
        assert_eq!(snapshot.neighbors[0].key, "rs");
        assert_eq!(snapshot.neighbors[0].net_mwh, 120.0);
        assert_eq!(snapshot.neighbors[1].key, "al");
        assert_eq!(snapshot.neighbors[1].net_mwh, -40.0);

        assert_eq!(snapshot.totals.import_mwh, 160.0);
        assert_eq!(snapshot.totals.export_mwh, 80.0);
        assert_eq!(snapshot.totals.net_mwh, 80.0);
    }

    #[tokio::test]
    async fn test_sort_keeps_ties_in_config_order_and_places_empty_neighbors() {
        // Albania and Serbia tie at 50, North Macedonia has no data,
        // Montenegro nets -10.
        let config = NeighborConfig::new(
            HOME,
            vec![
                Neighbor::new(ME, "Montenegro"),
                Neighbor::new(AL, "Albania"),
                Neighbor::new(MK, "North Macedonia"),
                Neighbor::new(RS, "Serbia"),
            ],
        )
        .unwrap();
        let source = FakeFlowSource::default()
            .with(HOME, ME, volume(1, 5.0))
            .with(ME, HOME, volume(1, 15.0))
            .with(HOME, AL, volume(2, 60.0))
            .with(AL, HOME, volume(2, 10.0))
            .with(HOME, RS, volume(3, 50.0));

        let snapshot = build_snapshot(&source, &config, january())
            .await
            .unwrap()
            .snapshot;

        let order: Vec<(&str, f64, bool)> = snapshot
            .neighbors
            .iter()
            .map(|n| (n.key.as_str(), n.net_mwh, n.has_data))
            .collect();
        assert_eq!(
            order,
            vec![
                ("al", 50.0, true),
                ("rs", 50.0, true),
                ("mk", 0.0, false),
                ("me", -10.0, true),
            ]
        );
        assert_eq!(snapshot.totals.net_mwh, 90.0);
    }

    #[tokio::test]
    async fn test_fetches_sequentially_import_then_export() {
        let source = FakeFlowSource::default();

        build_snapshot(&source, &config(), january()).await.unwrap();

        let calls: Vec<(String, String)> = source
            .calls()
            .into_iter()
            .map(|(_, inbound, outbound)| (inbound, outbound))
            .collect();
        assert_eq!(
            calls,
            vec![
                (HOME.to_string(), AL.to_string()),
                (AL.to_string(), HOME.to_string()),
                (HOME.to_string(), RS.to_string()),
                (RS.to_string(), HOME.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_has_data_from_either_direction() {
        let source = FakeFlowSource::default().with(AL, HOME, volume(1, 5.0));

        let bundle = build_snapshot(&source, &config(), january()).await.unwrap();

        let albania = bundle.snapshot.neighbors.iter().find(|n| n.key == "al").unwrap();
        let serbia = bundle.snapshot.neighbors.iter().find(|n| n.key == "rs").unwrap();
        assert!(albania.has_data);
        assert!(!serbia.has_data);
        assert_eq!(serbia.net_mwh, 0.0);
    }

    #[tokio::test]
    async fn test_daily_series_spans_all_neighbors() {
        let source = FakeFlowSource::default()
            .with(HOME, AL, volume(1, 10.0))
            .with(AL, HOME, volume(2, 4.0))
            .with(HOME, RS, volume(1, 6.0));

        let bundle = build_snapshot(&source, &config(), january()).await.unwrap();

        assert_eq!(bundle.daily.len(), 2);
        assert_eq!(bundle.daily[0].date.to_string(), "2024-01-01");
        assert_eq!(bundle.daily[0].imports, 16.0);
        assert_eq!(bundle.daily[0].exports, 0.0);
        assert_eq!(bundle.daily[1].net, -4.0);
    }

    #[tokio::test]
    async fn test_source_failure_aborts_snapshot() {
        let source = FakeFlowSource::default().failing_for(january());
        let err = build_snapshot(&source, &config(), january()).await.unwrap_err();
        assert!(format!("{err:#}").contains("401"));
        assert_eq!(source.calls().len(), 1);
    }
}
