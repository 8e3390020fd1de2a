//! Time-series sweep engine.
//!
//! For every date in the configured range the engine:
//! 1. asks the provider for the day's rise/set events (a failure there only
//!    empties that date's events),
//! 2. builds the evaluation instants for the sweep mode,
//! 3. derives the observables at each instant and runs the selected models,
//! 4. appends one [`ResultRow`] per instant to the [`ResultTable`].

use chrono::{Duration, NaiveDate};

use crate::astro::{AstronomyProvider, ObserverCache};
use crate::core::{
    DayEvents, EvaluationInstant, EventKind, InstantKind, ObserverLocation, ResultRow,
};
use crate::error::{ensure_finite, CrescentError, CrescentResult};
use crate::models::{ModelInputs, ModelSelection};
use crate::services::aggregation::{composite_score, ResultTable};
use crate::services::derivation::derive_observables;
use crate::time::{day_range, format_utc, truncate_to_minute};

/// How evaluation instants are chosen within a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepMode {
    /// One instant per listed event that occurs that day, in list order.
    Sparse(Vec<EventKind>),
    /// Every minute from sunset through moonset, inclusive.
    Dense,
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Sparse(vec![EventKind::Sunset])
    }
}

/// Everything a sweep needs, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub location: ObserverLocation,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mode: SweepMode,
    pub models: ModelSelection,
}

impl SweepConfig {
    pub fn new(
        location: ObserverLocation,
        start: NaiveDate,
        end: NaiveDate,
        mode: SweepMode,
        models: ModelSelection,
    ) -> CrescentResult<Self> {
        location.validate()?;
        if end < start {
            return Err(CrescentError::config(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        if let SweepMode::Sparse(events) = &mode {
            if events.is_empty() {
                return Err(CrescentError::config(
                    "at least one event must be evaluated when full range is off",
                ));
            }
        }
        Ok(Self {
            location,
            start,
            end,
            mode,
            models,
        })
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        day_range(self.start, self.end)
    }
}

/// Evaluation instants for one date.
///
/// Dense mode yields nothing unless both sunset and moonset are present and
/// moonset is not earlier than sunset.
pub fn build_instants(events: &DayEvents, mode: &SweepMode) -> Vec<EvaluationInstant> {
    match mode {
        SweepMode::Sparse(kinds) => kinds
            .iter()
            .filter_map(|kind| {
                events
                    .get(*kind)
                    .map(|at| EvaluationInstant::new(at, InstantKind::Event(*kind)))
            })
            .collect(),
        SweepMode::Dense => match (events.sunset, events.moonset) {
            (Some(sunset), Some(moonset)) if moonset >= sunset => {
                let minutes = (moonset - sunset).num_minutes();
                (0..=minutes)
                    .map(|m| {
                        EvaluationInstant::new(sunset + Duration::minutes(m), InstantKind::Range)
                    })
                    .collect()
            }
            _ => Vec::new(),
        },
    }
}

fn describe_events(events: &DayEvents) -> String {
    let present = events.present();
    if present.is_empty() {
        return "none".to_string();
    }
    present
        .iter()
        .map(|(kind, at)| format!("{}={}", kind, format_utc(at)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drives a provider across a date range.
///
/// The engine owns the run's observer cache; drop the engine to discard it.
pub struct SweepEngine<P: AstronomyProvider> {
    provider: P,
    cache: ObserverCache<P::Observer>,
}

impl<P: AstronomyProvider> SweepEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: ObserverCache::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &ObserverCache<P::Observer> {
        &self.cache
    }

    /// Sweeps every date of `config` and returns the accumulated table.
    ///
    /// # Errors
    /// A failed astrometry query or a non-finite observable aborts the run.
    /// Failed event lookups do not: that date simply has no events.
    pub fn run(&mut self, config: &SweepConfig) -> CrescentResult<ResultTable> {
        let provider = &self.provider;
        let observer = self
            .cache
            .get_or_insert_with(&config.location, || provider.observer(&config.location));

        let mut table = ResultTable::new(&config.models);
        for date in config.dates() {
            let rows = self.sweep_date(&observer, date, config)?;
            table.extend(rows);
        }

        log::debug!("Sweep produced {} rows", table.len());
        Ok(table)
    }

    fn sweep_date(
        &self,
        observer: &P::Observer,
        date: NaiveDate,
        config: &SweepConfig,
    ) -> CrescentResult<Vec<ResultRow>> {
        let mut events = match self.provider.day_events(observer, date) {
            Ok(events) => events,
            Err(e) => {
                log::warn!("Failed to compute events for {}: {}", date, e);
                DayEvents::empty(date)
            }
        };
        events.date = date;
        log::info!("Events available for {}: {}", date, describe_events(&events));

        if let SweepMode::Sparse(kinds) = &config.mode {
            for kind in kinds.iter().filter(|kind| events.get(**kind).is_none()) {
                log::warn!("No {} on {}, skipping", kind, date);
            }
        }

        let instants = build_instants(&events, &config.mode);
        log::debug!("{} evaluation instants on {}", instants.len(), date);

        let lag_minutes = ensure_finite("lag_minutes", events.lag_minutes())?;

        instants
            .into_iter()
            .map(|instant| -> CrescentResult<ResultRow> {
                let at = truncate_to_minute(&instant.timestamp);
                let astrometry = self.provider.astrometry(observer, at)?;
                let observables = derive_observables(&astrometry, &at);
                observables.ensure_finite()?;

                let inputs = ModelInputs::from_observables(&observables, lag_minutes);
                let verdicts = config.models.evaluate(&inputs);
                let score = composite_score(
                    observables.moon_illumination_fraction,
                    observables.moon_crescent_width_deg,
                    observables.moon_altitude_deg,
                );

                Ok(ResultRow {
                    instant,
                    events,
                    observables,
                    lag_minutes,
                    composite_score: score,
                    verdicts,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 30).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 30, h, m, s).unwrap()
    }

    #[test]
    fn test_sparse_follows_requested_order_and_skips_missing() {
        let events = DayEvents::empty(date())
            .with(EventKind::Sunset, at(8, 20, 0))
            .with(EventKind::Moonset, at(9, 5, 0));

        let mode = SweepMode::Sparse(vec![
            EventKind::Moonset,
            EventKind::Moonrise,
            EventKind::Sunset,
        ]);
        let instants = build_instants(&events, &mode);
        let labels: Vec<&str> = instants.iter().map(|i| i.kind.label()).collect();
        assert_eq!(labels, vec!["moonset", "sunset"]);
        assert_eq!(instants[0].timestamp, at(9, 5, 0));
    }

    #[test]
    fn test_dense_is_inclusive_of_both_ends() {
        let events = DayEvents::empty(date())
            .with(EventKind::Sunset, at(8, 20, 0))
            .with(EventKind::Moonset, at(8, 25, 0));
        let instants = build_instants(&events, &SweepMode::Dense);
        assert_eq!(instants.len(), 6);
        assert_eq!(instants.first().unwrap().timestamp, at(8, 20, 0));
        assert_eq!(instants.last().unwrap().timestamp, at(8, 25, 0));
        assert!(instants.iter().all(|i| i.kind == InstantKind::Range));
    }

    #[test]
    fn test_dense_without_both_bounds_yields_nothing() {
        let only_sunset = DayEvents::empty(date()).with(EventKind::Sunset, at(8, 20, 0));
        assert!(build_instants(&only_sunset, &SweepMode::Dense).is_empty());

        let only_moonset = DayEvents::empty(date()).with(EventKind::Moonset, at(9, 0, 0));
        assert!(build_instants(&only_moonset, &SweepMode::Dense).is_empty());
    }

    #[test]
    fn test_dense_with_moonset_before_sunset_yields_nothing() {
        let events = DayEvents::empty(date())
            .with(EventKind::Sunset, at(8, 20, 0))
            .with(EventKind::Moonset, at(3, 10, 0));
        assert!(build_instants(&events, &SweepMode::Dense).is_empty());
    }

    #[test]
    fn test_sweep_config_validation() {
        let start = date();
        let end = date() - Duration::days(1);
        let models = ModelSelection::all();
        let location = ObserverLocation::melbourne();

        let err = SweepConfig::new(location, start, end, SweepMode::Dense, models.clone())
            .unwrap_err();
        assert!(err.is_configuration());

        let err = SweepConfig::new(
            location,
            start,
            start,
            SweepMode::Sparse(vec![]),
            models.clone(),
        )
        .unwrap_err();
        assert!(err.is_configuration());

        let config = SweepConfig::new(
            location,
            start,
            start + Duration::days(2),
            SweepMode::default(),
            models,
        )
        .unwrap();
        assert_eq!(config.dates().count(), 3);
    }

    proptest! {
        #[test]
        fn prop_dense_instant_count(offset_s in 0i64..86_400, span_s in 0i64..20_000) {
            let sunset =
                Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap() + Duration::seconds(offset_s);
            let moonset = sunset + Duration::seconds(span_s);
            let events = DayEvents::empty(date())
                .with(EventKind::Sunset, sunset)
                .with(EventKind::Moonset, moonset);

            let instants = build_instants(&events, &SweepMode::Dense);
            prop_assert_eq!(instants.len() as i64, span_s / 60 + 1);
            prop_assert_eq!(instants[0].timestamp, sunset);

            let last = instants[instants.len() - 1].timestamp;
            prop_assert!(last <= moonset);
            prop_assert!(moonset - last < Duration::minutes(1));
            prop_assert!(instants.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }
    }
}
