//! XML parser for transparency-platform time-series documents.
//!
//! The document is first deserialized into a typed tree whose leaves are all
//! optional strings, then validated once here: unusable points are dropped,
//! everything else becomes [`EnergySample`]s.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::snapshot::types::{EnergySample, FlowVolume};

#[derive(Debug, Default, Deserialize)]
struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeSeries {
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Default, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval", default)]
    time_interval: Option<TimeInterval>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeInterval {
    #[serde(default)]
    start: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Point {
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
}

/// Converts one response body into a [`FlowVolume`].
///
/// A document without time series (including the platform's "no matching
/// data" acknowledgement) is a valid empty result.
///
/// # Errors
///
/// Returns an error if the payload is not well-formed XML.
pub fn parse_flow_document(xml: &str) -> Result<FlowVolume> {
    if xml.trim().is_empty() {
        return Ok(FlowVolume::empty());
    }

    let document: MarketDocument =
        quick_xml::de::from_str(xml).context("failed to parse time-series XML")?;

    let has_data = document
        .time_series
        .iter()
        .any(|series| !series.periods.is_empty());

    let mut energy_mwh = 0.0;
    let mut samples = Vec::new();

    for period in document.time_series.iter().flat_map(|s| &s.periods) {
        let hours = resolution_hours(period.resolution.as_deref());
        let Some(step) = resolution_step(hours) else {
            debug!(hours, "Resolution out of range, skipping period");
            continue;
        };
        let start = period
            .time_interval
            .as_ref()
            .and_then(|interval| interval.start.as_deref())
            .and_then(parse_instant);

        for (idx, point) in period.points.iter().enumerate() {
            let Some(quantity) = point.quantity.as_deref().and_then(parse_number) else {
                continue;
            };
            let energy = quantity * hours;

            let Some(start) = start else {
                energy_mwh += energy;
                continue;
            };
            let offset = point_offset(point.position.as_deref(), idx);
            let Some(timestamp) = step
                .checked_mul(offset)
                .and_then(|delta| start.checked_add_signed(delta))
            else {
                debug!(offset, "Point lies outside the representable range, skipping");
                continue;
            };

            energy_mwh += energy;
            samples.push(EnergySample {
                timestamp,
                energy_mwh: energy,
            });
        }
    }

    samples.sort_by_key(|sample| sample.timestamp);

    Ok(FlowVolume {
        energy_mwh,
        has_data,
        samples,
    })
}

/// Hours covered by one point. Accepts `PT{n}H{m}M` with either part
/// optional; anything else (or nothing) means one hour.
pub fn resolution_hours(resolution: Option<&str>) -> f64 {
    resolution.and_then(parse_resolution).unwrap_or(1.0)
}

fn parse_resolution(value: &str) -> Option<f64> {
    let mut rest = value.trim().strip_prefix("PT")?;

    let mut hours = 0u64;
    let mut minutes = 0u64;
    let mut matched = false;

    if let Some(idx) = rest.find('H') {
        hours = parse_digits(&rest[..idx])?;
        rest = &rest[idx + 1..];
        matched = true;
    }
    if let Some(idx) = rest.find('M') {
        minutes = parse_digits(&rest[..idx])?;
        rest = &rest[idx + 1..];
        matched = true;
    }

    if !matched || !rest.is_empty() {
        return None;
    }

    let total = hours as f64 + minutes as f64 / 60.0;
    (total > 0.0).then_some(total)
}

/// Duration of one point, or `None` when it does not fit a [`TimeDelta`].
fn resolution_step(hours: f64) -> Option<TimeDelta> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Zero-based step index of a point: `position - 1` when the position is a
/// positive integer, otherwise the point's ordinal within its period.
fn point_offset(position: Option<&str>, ordinal: usize) -> i32 {
    position
        .and_then(|p| p.trim().parse::<i32>().ok())
        .filter(|p| *p >= 1)
        .map_or_else(|| i32::try_from(ordinal).unwrap_or(i32::MAX), |p| p - 1)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// RFC 3339, or the platform's minute-precision `YYYY-MM-DDTHH:MMZ`.
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ").map(|dt| dt.and_utc()))
        .ok()
}
