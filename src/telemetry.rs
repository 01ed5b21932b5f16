//! Raw telemetry parsing.
//!
//! Converts Nightscout-style JSON (glucose entries, treatments and the IOB
//! property) into engine records. Parsing is lenient per entry and strict about
//! the anchor: a malformed optional entry is skipped with a warning, but if the
//! newest glucose entry cannot be read the whole refresh fails, because the
//! readout would otherwise show a stale value as current.

use core::fmt::Write as _;

use chrono::{DateTime, Utc};
use glucose_matrix_common::{GlucoseSample, TreatmentEvent, TreatmentKind, TrendDirection};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry contains no glucose entries")]
    NoEntries,

    #[error("newest glucose entry is malformed: {0}")]
    MalformedAnchor(String),
}

// =============================================================================
// Glucose Entries
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    sgv: Option<f64>,
    mbg: Option<f64>,
    #[serde(rename = "dateString")]
    date_string: Option<String>,
    date: Option<f64>,
    direction: Option<String>,
}

/// Parsed glucose entries, newest first as delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries {
    pub samples: Vec<GlucoseSample>,
    /// Id of the newest entry, used for change detection.
    pub newest_id: Option<String>,
}

impl Entries {
    /// Timestamp of the newest sample.
    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> { self.samples.iter().map(|s| s.timestamp).max() }
}

/// Parse an entries array.
///
/// Only `sgv` (sensor) and `mbg` (meter) entries are used; other types are
/// ignored. The first glucose entry is the anchor and must be well formed.
pub fn parse_entries(json: &str) -> Result<Entries, TelemetryError> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    let mut samples = Vec::new();
    let mut newest_id = None;

    for (index, value) in raw.into_iter().enumerate() {
        let entry: RawEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) if samples.is_empty() => {
                return Err(TelemetryError::MalformedAnchor(e.to_string()));
            }
            Err(e) => {
                warn!("Skipping unreadable entry {index}: {e}");
                continue;
            }
        };
        let is_anchor = samples.is_empty();

        match (entry.kind.as_deref(), to_sample(&entry)) {
            (Some("sgv" | "mbg"), Ok(sample)) => {
                if is_anchor {
                    newest_id.clone_from(&entry.id);
                }
                samples.push(sample);
            }
            (Some("sgv" | "mbg"), Err(reason)) if is_anchor => return Err(TelemetryError::MalformedAnchor(reason)),
            (Some("sgv" | "mbg"), Err(reason)) => warn!("Skipping entry {index}: {reason}"),
            (other, _) => debug!("Ignoring entry {index} of type {other:?}"),
        }
    }

    if samples.is_empty() {
        return Err(TelemetryError::NoEntries);
    }
    Ok(Entries { samples, newest_id })
}

fn to_sample(entry: &RawEntry) -> Result<GlucoseSample, String> {
    let timestamp = entry_timestamp(entry.date_string.as_deref(), entry.date)?;
    match entry.kind.as_deref() {
        Some("sgv") => {
            let value = glucose_value(entry.sgv, "sgv")?;
            let trend = entry.direction.as_deref().and_then(TrendDirection::from_name);
            Ok(GlucoseSample::sensor(value, timestamp, trend))
        }
        Some("mbg") => Ok(GlucoseSample::meter(glucose_value(entry.mbg, "mbg")?, timestamp)),
        other => Err(format!("unsupported entry type {other:?}")),
    }
}

fn glucose_value(value: Option<f64>, field: &str) -> Result<i32, String> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v as i32),
        Some(v) => Err(format!("invalid {field} value {v}")),
        None => Err(format!("missing {field} value")),
    }
}

/// Timestamp from an RFC 3339 string, falling back to epoch milliseconds.
fn entry_timestamp(date_string: Option<&str>, epoch_ms: Option<f64>) -> Result<DateTime<Utc>, String> {
    if let Some(text) = date_string {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Ok(parsed.with_timezone(&Utc));
        }
        debug!("Unparseable date string '{text}', trying epoch field");
    }
    epoch_ms
        .filter(|ms| ms.is_finite())
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .ok_or_else(|| String::from("missing or invalid timestamp"))
}

// =============================================================================
// Treatments
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawTreatment {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "eventType")]
    event_type: Option<String>,
    created_at: Option<String>,
    mills: Option<f64>,
    insulin: Option<f64>,
    carbs: Option<f64>,
    duration: Option<f64>,
}

/// Which amount fields an event type carries.
fn treatment_kinds(event_type: &str) -> &'static [TreatmentKind] {
    match event_type {
        "Bolus" | "Correction Bolus" => &[TreatmentKind::Bolus],
        "Carbs" | "Carb Correction" => &[TreatmentKind::Carbs],
        "Meal Bolus" | "Snack Bolus" => &[TreatmentKind::Bolus, TreatmentKind::Carbs],
        "Exercise" => &[TreatmentKind::Exercise],
        _ => &[],
    }
}

/// Parse a treatments array. Unreadable, unknown or empty treatments are skipped.
pub fn parse_treatments(json: &str) -> Result<Vec<TreatmentEvent>, TelemetryError> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    let mut events = Vec::new();

    for (index, value) in raw.into_iter().enumerate() {
        let treatment: RawTreatment = match serde_json::from_value(value) {
            Ok(treatment) => treatment,
            Err(e) => {
                warn!("Skipping unreadable treatment {index}: {e}");
                continue;
            }
        };
        let event_type = treatment.event_type.as_deref().unwrap_or_default();
        let kinds = treatment_kinds(event_type);
        if kinds.is_empty() {
            debug!("Ignoring treatment {index} of type '{event_type}'");
            continue;
        }
        let Ok(timestamp) = entry_timestamp(treatment.created_at.as_deref(), treatment.mills) else {
            warn!("Skipping treatment {index}: missing or invalid timestamp");
            continue;
        };
        let id = treatment.id.clone().unwrap_or_else(|| format!("treatment-{index}"));

        for &kind in kinds {
            let amount = match kind {
                TreatmentKind::Bolus => treatment.insulin,
                TreatmentKind::Carbs => treatment.carbs,
                TreatmentKind::Exercise => treatment.duration,
            };
            match amount {
                Some(amount) if amount.is_finite() && amount > 0.0 => {
                    events.push(TreatmentEvent { id: id.clone(), kind, timestamp, amount: amount as f32 });
                }
                _ => debug!("Treatment {id} has no positive {kind:?} amount"),
            }
        }
    }

    Ok(events)
}

// =============================================================================
// Insulin On Board
// =============================================================================

/// Latest IOB from `{"iob": {"iob": x}}`. A missing value counts as zero.
pub fn parse_iob(json: &str) -> Result<f32, TelemetryError> {
    let root: Value = serde_json::from_str(json)?;
    let iob = root.get("iob").and_then(|inner| inner.get("iob")).and_then(Value::as_f64);
    if iob.is_none() {
        debug!("No IOB value in payload, using 0");
    }
    Ok(iob.unwrap_or(0.0) as f32)
}

// =============================================================================
// Data Age
// =============================================================================

/// Data age as `mm:ss` (minutes keep growing past 59).
pub fn format_age(age: chrono::Duration) -> heapless::String<16> {
    let seconds = age.num_seconds().max(0);
    let mut text = heapless::String::new();
    let _ = write!(text, "{:02}:{:02}", seconds / 60, seconds % 60);
    text
}

/// True if the newest sample is older than `max_age_minutes` at `now`.
pub fn is_stale(newest: DateTime<Utc>, now: DateTime<Utc>, max_age_minutes: i64) -> bool {
    now - newest > chrono::Duration::minutes(max_age_minutes)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use glucose_matrix_common::SampleKind;

    const ENTRIES: &str = r#"[
        {"_id": "a1", "type": "sgv", "sgv": 120, "dateString": "2024-05-01T12:00:00.000Z", "direction": "Flat"},
        {"_id": "a2", "type": "cal", "slope": 1000, "date": 1714564500000},
        {"_id": "a3", "type": "mbg", "mbg": 140, "date": 1714564200000},
        {"_id": "a4", "type": "sgv", "sgv": 130, "dateString": "2024-05-01T11:55:00.000Z", "direction": "NOT COMPUTABLE"}
    ]"#;

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(ENTRIES).unwrap();
        assert_eq!(entries.newest_id.as_deref(), Some("a1"));
        assert_eq!(entries.samples.len(), 3, "Calibration records are ignored");
        assert_eq!(entries.samples[0].value, 120);
        assert_eq!(entries.samples[0].trend, Some(TrendDirection::Flat));
        assert_eq!(entries.samples[1].kind, SampleKind::Meter);
        assert_eq!(entries.samples[2].trend, None, "Unknown direction falls back to none");
    }

    #[test]
    fn test_epoch_fallback() {
        let entries = parse_entries(r#"[{"type": "sgv", "sgv": 99, "date": 1714564800000}]"#).unwrap();
        assert_eq!(entries.samples[0].timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(entries.newest_id, None);
    }

    #[test]
    fn test_malformed_anchor_fails() {
        let json = r#"[{"type": "sgv", "dateString": "2024-05-01T12:00:00.000Z"}, {"type": "sgv", "sgv": 100, "date": 1}]"#;
        assert!(matches!(parse_entries(json), Err(TelemetryError::MalformedAnchor(_))));
    }

    #[test]
    fn test_malformed_later_entry_skipped() {
        let json = r#"[
            {"type": "sgv", "sgv": 100, "dateString": "2024-05-01T12:00:00Z"},
            {"type": "sgv", "sgv": "oops", "dateString": "2024-05-01T11:55:00Z"},
            {"type": "sgv", "dateString": "2024-05-01T11:50:00Z"},
            {"type": "sgv", "sgv": 110, "dateString": "2024-05-01T11:45:00Z"}
        ]"#;
        let entries = parse_entries(json).unwrap();
        assert_eq!(entries.samples.len(), 2);
    }

    #[test]
    fn test_no_entries() {
        assert!(matches!(parse_entries("[]"), Err(TelemetryError::NoEntries)));
        assert!(matches!(parse_entries(r#"[{"type": "cal"}]"#), Err(TelemetryError::NoEntries)));
        assert!(matches!(parse_entries("{"), Err(TelemetryError::Json(_))));
    }

    #[test]
    fn test_parse_treatments() {
        let json = r#"[
            {"_id": "t1", "eventType": "Meal Bolus", "created_at": "2024-05-01T11:50:00.000Z", "insulin": 4.5, "carbs": 40},
            {"_id": "t2", "eventType": "Correction Bolus", "created_at": "2024-05-01T11:40:00.000Z", "insulin": 1.0},
            {"_id": "t3", "eventType": "Exercise", "created_at": "2024-05-01T10:00:00.000Z", "duration": 30},
            {"_id": "t4", "eventType": "Note", "created_at": "2024-05-01T10:00:00.000Z", "notes": "hi"},
            {"_id": "t5", "eventType": "Carb Correction", "created_at": "2024-05-01T10:00:00.000Z", "carbs": 0},
            {"_id": "t6", "eventType": "Bolus", "insulin": 2.0}
        ]"#;
        let events = parse_treatments(json).unwrap();
        let summary: Vec<_> = events.iter().map(|e| (e.id.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("t1", TreatmentKind::Bolus),
                ("t1", TreatmentKind::Carbs),
                ("t2", TreatmentKind::Bolus),
                ("t3", TreatmentKind::Exercise),
            ]
        );
        assert!((events[0].amount - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_iob() {
        assert!((parse_iob(r#"{"iob": {"iob": 2.35, "activity": 0.01}}"#).unwrap() - 2.35).abs() < 1e-6);
        assert_eq!(parse_iob(r#"{"iob": {}}"#).unwrap(), 0.0);
        assert_eq!(parse_iob("{}").unwrap(), 0.0);
        assert!(parse_iob("not json").is_err());
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(chrono::Duration::seconds(754)).as_str(), "12:34");
        assert_eq!(format_age(chrono::Duration::seconds(-5)).as_str(), "00:00");
        assert_eq!(format_age(chrono::Duration::minutes(125)).as_str(), "125:00");
    }

    #[test]
    fn test_is_stale() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(!is_stale(now - chrono::Duration::minutes(20), now, 20), "Exactly at the limit is fresh");
        assert!(is_stale(now - chrono::Duration::minutes(21), now, 20));
    }
}
