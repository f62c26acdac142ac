use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::TrackName;

pub fn track_name(value: &Value) -> Result<TrackName> {
    match value {
        Value::String(x) => Ok(TrackName(x.clone())),
        Value::Number(x) => Ok(TrackName(x.to_string())),
        x => bail!("track ID {x} isn't a string or number"),
    }
}

/// Accepts RFC 3339 strings, zoneless date-times (taken as UTC), or milliseconds since the Unix
/// epoch, either as a number or a numeric string.
pub fn parse_instant(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Number(x) => match x.as_f64() {
            Some(ms) => from_epoch_millis(ms),
            None => bail!("timestamp {x} isn't representable"),
        },
        Value::String(x) => parse_instant_str(x),
        x => bail!("timestamp {x} isn't a string or number"),
    }
}

fn parse_instant_str(x: &str) -> Result<DateTime<Utc>> {
    let x = x.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(x) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(x, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(ms) = x.parse::<f64>() {
        return from_epoch_millis(ms);
    }
    bail!("can't parse timestamp {x}")
}

fn from_epoch_millis(ms: f64) -> Result<DateTime<Utc>> {
    if !ms.is_finite() {
        bail!("timestamp {ms} isn't finite");
    }
    Utc.timestamp_millis_opt(ms.round() as i64)
        .single()
        .ok_or_else(|| anyhow!("timestamp {ms} is out of range"))
}
