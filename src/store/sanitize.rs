//! Normalises records read back from disk.
//!
//! Older files used camelCase or `_mwh` suffixed field names and sometimes
//! stored the neighbor's label instead of its key. Everything is coerced to
//! the current [`MonthlyRecord`] shape, with neighbor references resolved
//! against the configured table; records without a period or neighbor are
//! dropped.

use serde_json::{Map, Value};

use crate::neighbors::NeighborConfig;
use crate::snapshot::utility::round2;
use crate::store::records::MonthlyRecord;

const PERIOD_FIELDS: &[&str] = &["period", "month"];
const NEIGHBOR_FIELDS: &[&str] = &["neighbor", "neighbour", "code"];
const IMPORT_FIELDS: &[&str] = &["import", "import_mwh", "importMWh"];
const EXPORT_FIELDS: &[&str] = &["export", "export_mwh", "exportMWh"];
const NET_FIELDS: &[&str] = &["net", "net_mwh", "netMWh"];
const HAS_DATA_FIELDS: &[&str] = &["has_data", "hasData"];

pub fn sanitize_monthly(value: &Value, config: &NeighborConfig) -> Option<MonthlyRecord> {
    let object = value.as_object()?;

    let period = first_string(object, PERIOD_FIELDS)?;
    let neighbor = first_string(object, NEIGHBOR_FIELDS)?;

    let import = round2(first_number(object, IMPORT_FIELDS));
    let export = round2(first_number(object, EXPORT_FIELDS));
    let net = round2(first_number(object, NET_FIELDS));
    let has_data = first_value(object, HAS_DATA_FIELDS)
        .and_then(as_bool)
        .unwrap_or(import != 0.0 || export != 0.0);

    Some(MonthlyRecord {
        period,
        neighbor: config.resolve_key(&neighbor),
        import,
        export,
        net,
        has_data,
    })
}

fn first_value<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| object.get(*name).filter(|v| !v.is_null()))
}

fn first_string(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    let text = match first_value(object, names)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// 0.0 for anything that is not a finite number or a numeric string.
fn first_number(object: &Map<String, Value>, names: &[&str]) -> f64 {
    let number = match first_value(object, names) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
