//! Glucose samples, treatment events and the bounded working set.
//!
//! Everything here is plain data. Records are built once per refresh from raw
//! telemetry, handed to the renderer by reference and dropped afterwards.

use alloc::string::String;
use alloc::vec::Vec;

use chrono::{DateTime, Duration, Utc};

// =============================================================================
// Glucose Samples
// =============================================================================

/// Source of a glucose reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleKind {
    /// Continuous glucose monitor reading.
    Sensor,
    /// Fingerstick calibration reading.
    Meter,
}

/// Trend arrow reported with a sensor reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendDirection {
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
}

impl TrendDirection {
    /// Parse the direction names used by Nightscout-style telemetry.
    ///
    /// Unknown names (`"NONE"`, `"NOT COMPUTABLE"`, ...) return `None` and the
    /// readout falls back to a blank arrow.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DoubleUp" => Some(Self::DoubleUp),
            "SingleUp" => Some(Self::SingleUp),
            "FortyFiveUp" => Some(Self::FortyFiveUp),
            "Flat" => Some(Self::Flat),
            "FortyFiveDown" => Some(Self::FortyFiveDown),
            "SingleDown" => Some(Self::SingleDown),
            "DoubleDown" => Some(Self::DoubleDown),
            _ => None,
        }
    }

    /// Canonical telemetry name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DoubleUp => "DoubleUp",
            Self::SingleUp => "SingleUp",
            Self::FortyFiveUp => "FortyFiveUp",
            Self::Flat => "Flat",
            Self::FortyFiveDown => "FortyFiveDown",
            Self::SingleDown => "SingleDown",
            Self::DoubleDown => "DoubleDown",
        }
    }
}

/// One glucose reading.
///
/// `value` is the true reading. Coordinate mapping clamps it to the display
/// range; text and color decisions always see the raw value.
#[derive(Clone, Debug, PartialEq)]
pub struct GlucoseSample {
    pub kind: SampleKind,
    pub value: i32,
    pub timestamp: DateTime<Utc>,
    pub trend: Option<TrendDirection>,
}

impl GlucoseSample {
    pub fn sensor(value: i32, timestamp: DateTime<Utc>, trend: Option<TrendDirection>) -> Self {
        Self { kind: SampleKind::Sensor, value, timestamp, trend }
    }

    pub fn meter(value: i32, timestamp: DateTime<Utc>) -> Self {
        Self { kind: SampleKind::Meter, value, timestamp, trend: None }
    }

    #[inline]
    pub fn is_sensor(&self) -> bool { self.kind == SampleKind::Sensor }
}

// =============================================================================
// Treatment Events
// =============================================================================

/// Kind of a logged treatment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreatmentKind {
    /// Insulin dose; amount in units.
    Bolus,
    /// Carbohydrate intake; amount in grams.
    Carbs,
    /// Physical activity; amount is a duration in minutes.
    Exercise,
}

/// One logged treatment.
#[derive(Clone, Debug, PartialEq)]
pub struct TreatmentEvent {
    pub id: String,
    pub kind: TreatmentKind,
    pub timestamp: DateTime<Utc>,
    /// Non-negative dose, grams or minutes depending on `kind`.
    pub amount: f32,
}

impl TreatmentEvent {
    /// End of the event. Point events end where they start.
    ///
    /// Durations past the representable range saturate at the latest UTC time.
    pub fn end(&self) -> DateTime<Utc> {
        match self.kind {
            TreatmentKind::Exercise => Duration::try_seconds((self.amount * 60.0) as i64)
                .and_then(|duration| self.timestamp.checked_add_signed(duration))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            TreatmentKind::Bolus | TreatmentKind::Carbs => self.timestamp,
        }
    }

    /// True if `at` falls inside `[timestamp, end]`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool { self.timestamp <= at && at <= self.end() }
}

// =============================================================================
// Working Set
// =============================================================================

/// The bounded, newest-first window of telemetry used for one render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkingSet {
    samples: Vec<GlucoseSample>,
    treatments: Vec<TreatmentEvent>,
    iob_history: Vec<f32>,
}

impl WorkingSet {
    /// Build a working set holding at most `capacity` samples.
    ///
    /// Samples are sorted newest first (stable, so equal timestamps keep input
    /// order) before truncation. Negative treatment amounts are dropped.
    /// `iob_history` is newest first and is kept as given.
    pub fn new(
        mut samples: Vec<GlucoseSample>,
        mut treatments: Vec<TreatmentEvent>,
        iob_history: Vec<f32>,
        capacity: usize,
    ) -> Self {
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        samples.truncate(capacity);

        let before = treatments.len();
        treatments.retain(|t| t.amount.is_finite() && t.amount >= 0.0);
        if treatments.len() != before {
            log::warn!("dropped {} treatments with invalid amounts", before - treatments.len());
        }
        treatments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Self { samples, treatments, iob_history }
    }

    #[inline]
    pub fn samples(&self) -> &[GlucoseSample] { &self.samples }

    #[inline]
    pub fn treatments(&self) -> &[TreatmentEvent] { &self.treatments }

    #[inline]
    pub fn iob_history(&self) -> &[f32] { &self.iob_history }

    #[inline]
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    /// Sample that anchors the readout: the newest sensor reading, or the
    /// newest reading of any kind if no sensor reading exists.
    pub fn anchor(&self) -> Option<&GlucoseSample> {
        self.samples.iter().find(|s| s.is_sensor()).or_else(|| self.samples.first())
    }

    /// Difference between the two newest sensor readings. Zero when fewer than
    /// two exist.
    pub fn delta(&self) -> i32 {
        let mut sensors = self.samples.iter().filter(|s| s.is_sensor());
        match (sensors.next(), sensors.next()) {
            (Some(first), Some(second)) => first.value - second.value,
            _ => 0,
        }
    }

    /// Lowest sample value in the set.
    pub fn min_value(&self) -> Option<i32> { self.samples.iter().map(|s| s.value).min() }

    /// Highest sample value in the set.
    pub fn max_value(&self) -> Option<i32> { self.samples.iter().map(|s| s.value).max() }

    /// Timestamps of the oldest and newest samples.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.samples.last()?.timestamp, self.samples.first()?.timestamp))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[test]
    fn test_trend_names_roundtrip() {
        for name in ["DoubleUp", "SingleUp", "FortyFiveUp", "Flat", "FortyFiveDown", "SingleDown", "DoubleDown"] {
            let trend = TrendDirection::from_name(name).expect("known name");
            assert_eq!(trend.name(), name);
        }
        assert_eq!(TrendDirection::from_name("NOT COMPUTABLE"), None);
    }

    #[test]
    fn test_working_set_sorts_newest_first_and_truncates() {
        let samples = (0..10).map(|i| GlucoseSample::sensor(100 + i, at(i64::from(i) * 5), None)).collect();
        let set = WorkingSet::new(samples, Vec::new(), Vec::new(), 4);
        assert_eq!(set.samples().len(), 4);
        assert_eq!(set.samples()[0].value, 109, "Newest sample must come first");
        assert_eq!(set.samples()[3].value, 106);
    }

    #[test]
    fn test_anchor_prefers_sensor() {
        let samples = vec![GlucoseSample::meter(150, at(0)), GlucoseSample::sensor(120, at(-5), None)];
        let set = WorkingSet::new(samples, Vec::new(), Vec::new(), 10);
        assert_eq!(set.anchor().map(|s| s.value), Some(120));
    }

    #[test]
    fn test_anchor_falls_back_to_meter() {
        let set = WorkingSet::new(vec![GlucoseSample::meter(150, at(0))], Vec::new(), Vec::new(), 10);
        assert_eq!(set.anchor().map(|s| s.value), Some(150));
    }

    #[test]
    fn test_delta_skips_meter_readings() {
        let samples = vec![
            GlucoseSample::sensor(120, at(0), None),
            GlucoseSample::meter(200, at(-2)),
            GlucoseSample::sensor(130, at(-5), None),
        ];
        let set = WorkingSet::new(samples, Vec::new(), Vec::new(), 10);
        assert_eq!(set.delta(), -10);
    }

    #[test]
    fn test_delta_single_sample_is_zero() {
        let set = WorkingSet::new(vec![GlucoseSample::sensor(120, at(0), None)], Vec::new(), Vec::new(), 10);
        assert_eq!(set.delta(), 0);
    }

    #[test]
    fn test_exercise_covers_interval_inclusive() {
        let exercise =
            TreatmentEvent { id: String::from("e"), kind: TreatmentKind::Exercise, timestamp: at(0), amount: 30.0 };
        assert!(exercise.covers(at(0)));
        assert!(exercise.covers(at(30)), "Interval end is inclusive");
        assert!(!exercise.covers(at(31)));
        assert!(!exercise.covers(at(-1)));
    }

    #[test]
    fn test_huge_exercise_duration_saturates() {
        let exercise =
            |amount| TreatmentEvent { id: String::from("e"), kind: TreatmentKind::Exercise, timestamp: at(0), amount };
        for amount in [1.0e12, 1.0e16, f32::MAX] {
            let event = exercise(amount);
            assert_eq!(event.end(), DateTime::<Utc>::MAX_UTC, "Duration {amount} should saturate");
            assert!(event.covers(at(60)));
            assert!(!event.covers(at(-1)));
        }
    }

    #[test]
    fn test_negative_amounts_dropped() {
        let treatments = vec![
            TreatmentEvent { id: String::from("a"), kind: TreatmentKind::Bolus, timestamp: at(0), amount: -1.0 },
            TreatmentEvent { id: String::from("b"), kind: TreatmentKind::Carbs, timestamp: at(0), amount: 20.0 },
        ];
        let set = WorkingSet::new(Vec::new(), treatments, Vec::new(), 10);
        assert_eq!(set.treatments().len(), 1);
        assert_eq!(set.treatments()[0].id, "b");
    }

    #[test]
    fn test_time_span_and_extremes() {
        let samples = vec![
            GlucoseSample::sensor(90, at(0), None),
            GlucoseSample::sensor(250, at(-5), None),
            GlucoseSample::sensor(40, at(-10), None),
        ];
        let set = WorkingSet::new(samples, Vec::new(), Vec::new(), 10);
        assert_eq!(set.time_span(), Some((at(-10), at(0))));
        assert_eq!(set.min_value(), Some(40));
        assert_eq!(set.max_value(), Some(250));
    }
}
