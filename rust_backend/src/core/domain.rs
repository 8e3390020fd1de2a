//! Domain models for crescent visibility evaluation.
//!
//! One run evaluates a fixed observer over a range of UTC calendar dates. Each
//! date contributes a [`DayEvents`] snapshot and zero or more
//! [`EvaluationInstant`]s; each instant becomes one immutable [`ResultRow`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CrescentError, CrescentResult};
use crate::models::VisibilityModel;

/// Geographic observer position.
///
/// Equality and hashing use the exact bit pattern of the three coordinates so
/// the value can key the observer cache: two locations are the same key only
/// if every coordinate is bit-for-bit identical.
///
/// # Examples
///
/// ```
/// use crescent_vis::core::ObserverLocation;
///
/// let site = ObserverLocation::new(-37.8136, 144.9631, 31.0).unwrap();
/// assert_eq!(site, ObserverLocation::melbourne());
/// assert!(ObserverLocation::new(91.0, 0.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObserverLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

impl ObserverLocation {
    /// Creates a validated location.
    ///
    /// Latitude must lie in [-90, 90], longitude in [-180, 180] and every
    /// coordinate must be finite.
    pub fn new(latitude_deg: f64, longitude_deg: f64, elevation_m: f64) -> CrescentResult<Self> {
        let location = Self {
            latitude_deg,
            longitude_deg,
            elevation_m,
        };
        location.validate()?;
        Ok(location)
    }

    /// Melbourne, Australia: the default site of the March 2025 survey.
    pub fn melbourne() -> Self {
        Self {
            latitude_deg: -37.8136,
            longitude_deg: 144.9631,
            elevation_m: 31.0,
        }
    }

    pub fn validate(&self) -> CrescentResult<()> {
        if !self.latitude_deg.is_finite()
            || !self.longitude_deg.is_finite()
            || !self.elevation_m.is_finite()
        {
            return Err(CrescentError::config(format!(
                "observer coordinates must be finite, got {self}"
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(CrescentError::config(format!(
                "latitude must be within [-90, 90], got {}",
                self.latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude_deg) {
            return Err(CrescentError::config(format!(
                "longitude must be within [-180, 180], got {}",
                self.longitude_deg
            )));
        }
        Ok(())
    }

    fn key(&self) -> (u64, u64, u64) {
        (
            self.latitude_deg.to_bits(),
            self.longitude_deg.to_bits(),
            self.elevation_m.to_bits(),
        )
    }
}

impl Default for ObserverLocation {
    fn default() -> Self {
        Self::melbourne()
    }
}

impl PartialEq for ObserverLocation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ObserverLocation {}

impl Hash for ObserverLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for ObserverLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {} m)",
            self.latitude_deg, self.longitude_deg, self.elevation_m
        )
    }
}

/// Per-instant snapshot of everything the models and writers consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservableVector {
    pub sun_altitude_deg: f64,
    pub moon_altitude_deg: f64,
    pub moon_sun_separation_deg: f64,
    pub moon_distance_km: f64,
    pub sun_distance_km: f64,
    pub moon_phase_angle_deg: f64,
    /// In [0, 1].
    pub moon_illumination_fraction: f64,
    /// `moon_illumination_fraction * 180`, a heuristic proxy.
    pub moon_crescent_width_deg: f64,
    /// Continuous days since the reference new moon; unbounded, may be negative.
    pub moon_age_days: f64,
    pub moon_apparent_magnitude: f64,
    pub sun_apparent_magnitude: f64,
}

impl ObservableVector {
    /// Fields as `(name, value)` pairs, in output column order.
    pub fn fields(&self) -> [(&'static str, f64); 11] {
        [
            ("sun_altitude_deg", self.sun_altitude_deg),
            ("moon_altitude_deg", self.moon_altitude_deg),
            ("moon_sun_separation_deg", self.moon_sun_separation_deg),
            ("moon_distance_km", self.moon_distance_km),
            ("sun_distance_km", self.sun_distance_km),
            ("moon_phase_angle_deg", self.moon_phase_angle_deg),
            ("moon_illumination_fraction", self.moon_illumination_fraction),
            ("moon_crescent_width_deg", self.moon_crescent_width_deg),
            ("moon_age_days", self.moon_age_days),
            ("moon_apparent_magnitude", self.moon_apparent_magnitude),
            ("sun_apparent_magnitude", self.sun_apparent_magnitude),
        ]
    }

    /// Fails with a numeric fault naming the first non-finite field.
    pub fn ensure_finite(&self) -> CrescentResult<()> {
        for (name, value) in self.fields() {
            crate::error::ensure_finite(name, value)?;
        }
        Ok(())
    }
}

/// Solar and lunar horizon events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sunrise,
    Sunset,
    Moonrise,
    Moonset,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Sunrise,
        EventKind::Sunset,
        EventKind::Moonrise,
        EventKind::Moonset,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Sunrise => "sunrise",
            EventKind::Sunset => "sunset",
            EventKind::Moonrise => "moonrise",
            EventKind::Moonset => "moonset",
        }
    }

    /// Key used by providers in their partial event maps, e.g. `sunset_utc`.
    pub fn provider_key(&self) -> &'static str {
        match self {
            EventKind::Sunrise => "sunrise_utc",
            EventKind::Sunset => "sunset_utc",
            EventKind::Moonrise => "moonrise_utc",
            EventKind::Moonset => "moonset_utc",
        }
    }

    /// Events a run may be asked to evaluate in sparse mode.
    pub fn is_evaluable(&self) -> bool {
        matches!(self, EventKind::Sunset | EventKind::Moonset)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventKind {
    type Err = CrescentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let name = normalized.strip_suffix("_utc").unwrap_or(&normalized);
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.label() == name)
            .ok_or_else(|| CrescentError::config(format!("unknown event '{}'", s)))
    }
}

/// Rise/set timestamps for one UTC calendar date.
///
/// A missing entry covers both "the event does not happen that day" and "the
/// provider failed to answer"; downstream code never distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayEvents {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub moonrise: Option<DateTime<Utc>>,
    pub moonset: Option<DateTime<Utc>>,
}

impl DayEvents {
    /// A date with no known events.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sunrise: None,
            sunset: None,
            moonrise: None,
            moonset: None,
        }
    }

    pub fn get(&self, kind: EventKind) -> Option<DateTime<Utc>> {
        match kind {
            EventKind::Sunrise => self.sunrise,
            EventKind::Sunset => self.sunset,
            EventKind::Moonrise => self.moonrise,
            EventKind::Moonset => self.moonset,
        }
    }

    pub fn set(&mut self, kind: EventKind, at: Option<DateTime<Utc>>) {
        match kind {
            EventKind::Sunrise => self.sunrise = at,
            EventKind::Sunset => self.sunset = at,
            EventKind::Moonrise => self.moonrise = at,
            EventKind::Moonset => self.moonset = at,
        }
    }

    pub fn with(mut self, kind: EventKind, at: DateTime<Utc>) -> Self {
        self.set(kind, Some(at));
        self
    }

    pub fn is_empty(&self) -> bool {
        EventKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    /// Present events in `EventKind::ALL` order.
    pub fn present(&self) -> Vec<(EventKind, DateTime<Utc>)> {
        EventKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind).map(|at| (*kind, at)))
            .collect()
    }

    /// Minutes from sunset to moonset, or 0 when either is missing.
    ///
    /// Not clamped: a moonset earlier in the day than sunset gives a negative lag.
    pub fn lag_minutes(&self) -> f64 {
        match (self.sunset, self.moonset) {
            (Some(sunset), Some(moonset)) => (moonset - sunset).num_seconds() as f64 / 60.0,
            _ => 0.0,
        }
    }
}

/// What an evaluation instant stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstantKind {
    /// Exactly at a named event.
    Event(EventKind),
    /// A member of the dense sunset → moonset sweep.
    Range,
}

impl InstantKind {
    pub fn label(&self) -> &'static str {
        match self {
            InstantKind::Event(kind) => kind.label(),
            InstantKind::Range => "range",
        }
    }
}

impl fmt::Display for InstantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for InstantKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationInstant {
    pub timestamp: DateTime<Utc>,
    pub kind: InstantKind,
}

impl EvaluationInstant {
    pub fn new(timestamp: DateTime<Utc>, kind: InstantKind) -> Self {
        Self { timestamp, kind }
    }
}

/// A model's classification at one instant.
///
/// Scores are model-local: 0 is "not visible" and each model has its own
/// maximum tier, so scores of different models are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModelVerdict {
    pub score: u8,
    pub label: &'static str,
}

impl ModelVerdict {
    pub const fn new(score: u8, label: &'static str) -> Self {
        Self { score, label }
    }
}

impl fmt::Display for ModelVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.score)
    }
}

/// Verdicts of the selected models, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelVerdicts(Vec<(VisibilityModel, ModelVerdict)>);

impl ModelVerdicts {
    pub fn get(&self, model: VisibilityModel) -> Option<&ModelVerdict> {
        self.0.iter().find(|(m, _)| *m == model).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(VisibilityModel, ModelVerdict)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(VisibilityModel, ModelVerdict)> for ModelVerdicts {
    fn from_iter<I: IntoIterator<Item = (VisibilityModel, ModelVerdict)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ModelVerdicts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (model, verdict) in &self.0 {
            map.serialize_entry(model.name(), verdict)?;
        }
        map.end()
    }
}

/// One evaluated instant. Built once by the sweep engine and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub instant: EvaluationInstant,
    pub events: DayEvents,
    pub observables: ObservableVector,
    pub lag_minutes: f64,
    pub composite_score: f64,
    pub verdicts: ModelVerdicts,
}

impl ResultRow {
    /// The swept calendar date.
    pub fn date(&self) -> NaiveDate {
        self.events.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 30).unwrap()
    }

    #[test]
    fn test_observer_location_hash_uses_exact_bits() {
        let mut seen = HashSet::new();
        seen.insert(ObserverLocation::melbourne());
        seen.insert(ObserverLocation::melbourne());
        seen.insert(ObserverLocation::new(-37.8136, 144.9631, 31.000001).unwrap());
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_observer_location_rejects_out_of_range() {
        assert!(ObserverLocation::new(-91.0, 0.0, 0.0).is_err());
        assert!(ObserverLocation::new(0.0, 180.5, 0.0).is_err());
        assert!(ObserverLocation::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(ObserverLocation::new(90.0, -180.0, -400.0).is_ok());
    }

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("sunset".parse::<EventKind>().unwrap(), EventKind::Sunset);
        assert_eq!("Moonset".parse::<EventKind>().unwrap(), EventKind::Moonset);
        assert_eq!("moonrise_utc".parse::<EventKind>().unwrap(), EventKind::Moonrise);
        assert!("noon".parse::<EventKind>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_lag_minutes_requires_both_events() {
        let sunset = Utc.with_ymd_and_hms(2025, 3, 30, 8, 0, 0).unwrap();
        let moonset = Utc.with_ymd_and_hms(2025, 3, 30, 8, 45, 30).unwrap();

        let only_sunset = DayEvents::empty(date()).with(EventKind::Sunset, sunset);
        assert_eq!(only_sunset.lag_minutes(), 0.0);

        let both = only_sunset.with(EventKind::Moonset, moonset);
        assert_eq!(both.lag_minutes(), 45.5);
    }

    #[test]
    fn test_lag_minutes_is_not_clamped() {
        let events = DayEvents::empty(date())
            .with(EventKind::Sunset, Utc.with_ymd_and_hms(2025, 3, 30, 8, 0, 0).unwrap())
            .with(EventKind::Moonset, Utc.with_ymd_and_hms(2025, 3, 30, 2, 0, 0).unwrap());
        assert_eq!(events.lag_minutes(), -360.0);
    }

    #[test]
    fn test_day_events_present_and_empty() {
        let empty = DayEvents::empty(date());
        assert!(empty.is_empty());
        assert!(empty.present().is_empty());

        let at = Utc.with_ymd_and_hms(2025, 3, 30, 20, 1, 2).unwrap();
        let events = empty.with(EventKind::Moonrise, at);
        assert!(!events.is_empty());
        assert_eq!(events.present(), vec![(EventKind::Moonrise, at)]);
    }

    #[test]
    fn test_observable_vector_finiteness() {
        let mut obs = ObservableVector {
            sun_altitude_deg: -0.8,
            moon_altitude_deg: 7.5,
            moon_sun_separation_deg: 11.0,
            moon_distance_km: 380_000.0,
            sun_distance_km: 149_000_000.0,
            moon_phase_angle_deg: 12.0,
            moon_illumination_fraction: 0.01,
            moon_crescent_width_deg: 1.8,
            moon_age_days: 9200.0,
            moon_apparent_magnitude: -12.7,
            sun_apparent_magnitude: -26.74,
        };
        assert!(obs.ensure_finite().is_ok());

        obs.moon_age_days = f64::NAN;
        let err = obs.ensure_finite().unwrap_err();
        assert!(matches!(
            err,
            CrescentError::NumericFault { field: "moon_age_days", .. }
        ));
    }

    #[test]
    fn test_instant_kind_labels() {
        assert_eq!(InstantKind::Range.label(), "range");
        assert_eq!(InstantKind::Event(EventKind::Sunset).to_string(), "sunset");
    }
}
