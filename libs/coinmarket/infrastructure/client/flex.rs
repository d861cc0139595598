//! Lenient readers for loosely typed JSON
//!
//! The backend is inconsistent about number encoding: the same field can
//! arrive as a JSON number or a numeric string, and timestamps as RFC 3339
//! strings or epoch numbers.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Epoch numbers at or above this are milliseconds, below are seconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// A finite number from a JSON number or numeric string
pub fn value_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A timestamp from RFC 3339 text or epoch seconds/millis
pub fn value_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| epoch_to_datetime(s.trim().parse().ok()?)),
        Value::Number(n) => epoch_to_datetime(n.as_f64()?),
        _ => None,
    }
}

fn epoch_to_datetime(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() || epoch < 0.0 {
        return None;
    }
    let millis = if epoch >= EPOCH_MILLIS_THRESHOLD {
        epoch
    } else {
        epoch * 1000.0
    };
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// `deserialize_with` helper for optional lenient numbers
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_f64))
}

/// `deserialize_with` helper for optional lenient timestamps
pub fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_timestamp))
}
