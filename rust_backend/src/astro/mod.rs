//! Astronomy provider contract.
//!
//! The sweep engine never computes positions itself. It asks an
//! [`AstronomyProvider`] for per-instant astrometry and per-date rise/set
//! events, and memoises the provider's observer handles in an
//! [`ObserverCache`] that lives exactly as long as the run.

pub mod ephemeris;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::core::{DayEvents, EventKind, ObserverLocation};
use crate::time::parse_utc;

pub use ephemeris::SiderustEphemeris;

/// Error type for provider queries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Event search failed: {0}")]
    EventSearch(String),

    #[error("Malformed event timestamp for {key}: '{value}'")]
    MalformedTimestamp { key: String, value: String },

    #[error("Provider error: {0}")]
    Other(String),
}

/// Apparent positions at one instant, as seen by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Astrometry {
    pub sun_altitude_deg: f64,
    pub moon_altitude_deg: f64,
    pub separation_deg: f64,
    pub moon_distance_km: f64,
    pub sun_distance_km: f64,
    /// Moon minus Sun ecliptic longitude, in [0, 360).
    pub phase_angle_deg: f64,
}

/// Source of positions and horizon events.
pub trait AstronomyProvider {
    /// Provider-specific observer representation, possibly expensive to build.
    type Observer: Clone;

    /// Builds the observer handle for a location. Must be idempotent.
    fn observer(&self, location: &ObserverLocation) -> Self::Observer;

    /// Positions at `at`. Callers pass minute-resolution instants.
    fn astrometry(
        &self,
        observer: &Self::Observer,
        at: DateTime<Utc>,
    ) -> Result<Astrometry, ProviderError>;

    /// Horizon events within the UTC calendar day `date`. Events that do not
    /// occur are simply absent.
    fn day_events(
        &self,
        observer: &Self::Observer,
        date: NaiveDate,
    ) -> Result<DayEvents, ProviderError>;
}

/// Builds [`DayEvents`] from a partial `{"sunset_utc": "2025-03-30T08:07:12Z", ...}` map.
///
/// Unknown keys are ignored; a value that is not `YYYY-MM-DDTHH:MM:SSZ` is an error.
pub fn events_from_iso_map(
    date: NaiveDate,
    map: &BTreeMap<String, String>,
) -> Result<DayEvents, ProviderError> {
    let mut events = DayEvents::empty(date);
    for kind in EventKind::ALL {
        if let Some(value) = map.get(kind.provider_key()) {
            let at = parse_utc(value).map_err(|_| ProviderError::MalformedTimestamp {
                key: kind.provider_key().to_string(),
                value: value.clone(),
            })?;
            events.set(kind, Some(at));
        }
    }
    Ok(events)
}

/// Run-scoped memo of provider observer handles.
///
/// Keyed by the exact `(lat, lon, elevation)` triple; never evicts.
#[derive(Debug, Clone)]
pub struct ObserverCache<H> {
    entries: HashMap<ObserverLocation, H>,
}

impl<H: Clone> ObserverCache<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the cached handle, building it only on first sight of `location`.
    pub fn get_or_insert_with<F>(&mut self, location: &ObserverLocation, build: F) -> H
    where
        F: FnOnce() -> H,
    {
        self.entries
            .entry(*location)
            .or_insert_with(|| {
                log::debug!("Building observer for {}", location);
                build()
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Clone> Default for ObserverCache<H> {
    fn default() -> Self {
        Self::new()
    }
}
