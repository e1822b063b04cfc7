//! Persisted dataset shapes.

use std::collections::BTreeMap;

use serde::Serialize;

/// One neighbor's totals for one month. Unique per `(period, neighbor)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecord {
    pub period: String,
    pub neighbor: String,
    pub import: f64,
    pub export: f64,
    pub net: f64,
    pub has_data: bool,
}

/// One UTC day of the most recently processed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub period: String,
    pub import: f64,
    pub export: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSummary {
    pub key: &'static str,
    pub granularity: &'static str,
    pub first: String,
    pub last: String,
    pub count: usize,
}

impl TimeSummary {
    /// Summarises the distinct periods of `periods`, which must be sorted.
    pub fn from_sorted<'a>(
        granularity: &'static str,
        periods: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let mut distinct: Vec<&str> = periods.into_iter().collect();
        distinct.dedup();
        Some(Self {
            key: "period",
            granularity,
            first: distinct.first()?.to_string(),
            last: distinct.last()?.to_string(),
            count: distinct.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionOption {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    pub time: TimeSummary,
    pub fields: Vec<FieldDescriptor>,
    pub dimensions: BTreeMap<&'static str, Vec<DimensionOption>>,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Dataset<'a, R> {
    pub meta: DatasetMeta,
    pub records: &'a [R],
}

pub const SOURCE: &str = "ENTSO-E Transparency Platform – Cross-border physical flows (A11)";

pub fn flow_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor {
            key: "import",
            label: "Import",
            unit: "MWh",
        },
        FieldDescriptor {
            key: "export",
            label: "Export",
            unit: "MWh",
        },
        FieldDescriptor {
            key: "net",
            label: "Net import",
            unit: "MWh",
        },
    ]
}
