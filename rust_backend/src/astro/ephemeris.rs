//! Sun and Moon provider backed by siderust.
//!
//! Positions come from siderust's default ephemeris (VSOP87 for the Sun,
//! ELP2000-82B for the Moon), reduced to apparent topocentric horizontal
//! coordinates for the observer's WGS84 site. No atmospheric refraction is
//! applied to astrometry; the rise/set horizons include the standard
//! refraction allowance.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use siderust::bodies::solar_system::{Moon, Sun};
use siderust::coordinates::centers::Geodetic;
use siderust::coordinates::frames::ECEF;
use siderust::event::altitude::{crossings, AltitudeProvider, CrossingDirection, SearchOpts};
use siderust::event::solar::night_types::Twilight;
use siderust::qtty::{AstronomicalUnit, Days, Degree, Degrees, Kilometer, Meter, Quantity};
use siderust::time::{Interval, JulianDate, ModifiedJulianDate};

use super::{events_from_iso_map, Astrometry, AstronomyProvider, ProviderError};
use crate::core::{DayEvents, EventKind, ObserverLocation};
use crate::time::{day_start, format_utc};

/// Topocentric altitude of the Moon's centre at rise/set: refraction plus the
/// mean lunar semidiameter.
const MOON_HORIZON_DEG: f64 = -0.5667 - 0.2725;

/// siderust ephemeris provider. Needs no external ephemeris files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiderustEphemeris {
    opts: SearchOpts,
}

impl SiderustEphemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rise/set crossings of `body` within the UTC day `date`, keyed the way
    /// the event map expects. A later crossing of the same kind replaces an
    /// earlier one.
    fn crossing_times<T: AltitudeProvider>(
        &self,
        body: &T,
        site: &Geodetic<ECEF>,
        date: NaiveDate,
        horizon: Degrees,
        (rising_kind, setting_kind): (EventKind, EventKind),
        map: &mut BTreeMap<String, String>,
    ) -> Result<(), ProviderError> {
        let start = ModifiedJulianDate::from_chrono(day_start(date));
        let window = Interval::new(start, start + Days::new(1.0));

        for event in crossings(body, site, window, horizon, self.opts) {
            let at = event
                .mjd
                .to_chrono()
                .ok_or_else(|| ProviderError::EventSearch(format!("crossing at {}", event.mjd)))?
                .trunc_subsecs(0);
            if at.date_naive() != date {
                continue;
            }
            let kind = match event.direction {
                CrossingDirection::Rising => rising_kind,
                CrossingDirection::Setting => setting_kind,
            };
            map.insert(kind.provider_key().to_string(), format_utc(&at));
        }
        Ok(())
    }
}

impl AstronomyProvider for SiderustEphemeris {
    type Observer = Geodetic<ECEF>;

    fn observer(&self, location: &ObserverLocation) -> Geodetic<ECEF> {
        Geodetic::<ECEF>::new(
            Degrees::new(location.longitude_deg),
            Degrees::new(location.latitude_deg),
            Quantity::<Meter>::new(location.elevation_m),
        )
    }

    fn astrometry(
        &self,
        observer: &Geodetic<ECEF>,
        at: DateTime<Utc>,
    ) -> Result<Astrometry, ProviderError> {
        let jd = JulianDate::from_chrono(at);
        if !jd.raw().value().is_finite() {
            return Err(ProviderError::InvalidTime(at.to_rfc3339()));
        }

        let sun = Sun::get_horizontal::<AstronomicalUnit>(jd, *observer);
        let moon = Moon::get_horizontal::<Kilometer>(jd, *observer);
        let geocentric = Moon::phase_geocentric(jd);
        let topocentric = Moon::phase_topocentric(jd, *observer);

        // Topocentric elongation is signed eastward in [0, 360)
        let elongation = topocentric.elongation.to::<Degree>().value();
        let separation_deg = if elongation > 180.0 {
            360.0 - elongation
        } else {
            elongation
        };

        Ok(Astrometry {
            sun_altitude_deg: sun.alt().to::<Degree>().value(),
            moon_altitude_deg: moon.alt().to::<Degree>().value(),
            separation_deg,
            moon_distance_km: moon.distance.value(),
            sun_distance_km: sun.distance.to::<Kilometer>().value(),
            phase_angle_deg: geocentric.elongation.to::<Degree>().value(),
        })
    }

    fn day_events(
        &self,
        observer: &Geodetic<ECEF>,
        date: NaiveDate,
    ) -> Result<DayEvents, ProviderError> {
        let mut map = BTreeMap::new();
        self.crossing_times(
            &Sun,
            observer,
            date,
            Degrees::from(Twilight::ApparentHorizon),
            (EventKind::Sunrise, EventKind::Sunset),
            &mut map,
        )?;
        self.crossing_times(
            &Moon,
            observer,
            date,
            Degrees::new(MOON_HORIZON_DEG),
            (EventKind::Moonrise, EventKind::Moonset),
            &mut map,
        )?;
        events_from_iso_map(date, &map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn greenwich() -> ObserverLocation {
        ObserverLocation::new(51.4769, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_distances_near_perihelion() {
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&greenwich());
        let at = Utc.with_ymd_and_hms(2025, 1, 4, 12, 0, 0).unwrap();
        let astro = provider.astrometry(&observer, at).unwrap();

        assert!(astro.sun_distance_km > 1.46e8 && astro.sun_distance_km < 1.48e8);
        assert!(astro.moon_distance_km > 350_000.0 && astro.moon_distance_km < 410_000.0);
    }

    #[test]
    fn test_noon_sun_altitude_at_equinox() {
        // At the March equinox local noon altitude ≈ 90° − latitude.
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&greenwich());
        let at = Utc.with_ymd_and_hms(2025, 3, 20, 12, 7, 0).unwrap();
        let astro = provider.astrometry(&observer, at).unwrap();
        assert_abs_diff_eq!(astro.sun_altitude_deg, 90.0 - 51.4769, epsilon = 1.0);
    }

    #[test]
    fn test_phase_angle_near_new_moon_is_small() {
        // New moon 2025-03-29 10:58 UTC
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&ObserverLocation::melbourne());
        let at = Utc.with_ymd_and_hms(2025, 3, 29, 10, 58, 0).unwrap();
        let astro = provider.astrometry(&observer, at).unwrap();

        let phase = astro.phase_angle_deg;
        assert!(phase < 1.0 || phase > 359.0, "phase angle {}", phase);
        assert!(astro.separation_deg < 12.0);
    }

    #[test]
    fn test_full_moon_separation_is_large() {
        // Full moon 2025-03-14 06:55 UTC
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&greenwich());
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 6, 55, 0).unwrap();
        let astro = provider.astrometry(&observer, at).unwrap();

        assert_abs_diff_eq!(astro.phase_angle_deg, 180.0, epsilon = 1.0);
        assert!(astro.separation_deg > 170.0);
    }

    #[test]
    fn test_separation_is_folded_into_half_circle() {
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&ObserverLocation::melbourne());
        for day in [1, 8, 15, 22] {
            let at = Utc.with_ymd_and_hms(2025, 4, day, 9, 0, 0).unwrap();
            let astro = provider.astrometry(&observer, at).unwrap();
            assert!((0.0..=180.0).contains(&astro.separation_deg));
            assert!((0.0..360.0).contains(&astro.phase_angle_deg));
        }
    }

    #[test]
    fn test_melbourne_sunset_on_survey_dates() {
        // Melbourne sunset late March 2025 is about 19:20 AEDT = 08:20 UTC.
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&ObserverLocation::melbourne());
        let date = NaiveDate::from_ymd_opt(2025, 3, 29).unwrap();
        let events = provider.day_events(&observer, date).unwrap();

        let sunset = events.sunset.expect("sunset should occur");
        let expected = Utc.with_ymd_and_hms(2025, 3, 29, 8, 20, 0).unwrap();
        assert!((sunset - expected).num_minutes().abs() < 10, "sunset {}", sunset);

        let sunrise = events.sunrise.expect("sunrise should occur");
        assert!(sunrise.date_naive() == date);
    }

    #[test]
    fn test_polar_summer_has_no_sunset() {
        let provider = SiderustEphemeris::new();
        let svalbard = ObserverLocation::new(78.2232, 15.6267, 0.0).unwrap();
        let observer = provider.observer(&svalbard);
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let events = provider.day_events(&observer, date).unwrap();

        assert!(events.sunset.is_none());
        assert!(events.sunrise.is_none());
    }

    #[test]
    fn test_event_times_are_whole_seconds_inside_the_day() {
        let provider = SiderustEphemeris::new();
        let observer = provider.observer(&greenwich());
        let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let events = provider.day_events(&observer, date).unwrap();

        assert!(events.present().len() >= 2);
        for (_, at) in events.present() {
            assert_eq!(at.date_naive(), date);
            assert_eq!(at.timestamp_subsec_nanos(), 0);
        }
    }
}
