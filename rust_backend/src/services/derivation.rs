//! Observable derivation.
//!
//! Turns provider astrometry into the full [`ObservableVector`]. The derived
//! quantities are closed-form:
//!
//! - illumination fraction `(1 - cos(phase)) / 2`
//! - crescent width `illumination * 180` degrees (a heuristic proxy, not a
//!   physical width)
//! - moon age: continuous days since a fixed reference new moon, never
//!   wrapped at the synodic month, negative before the reference epoch

use chrono::{DateTime, Utc};
use siderust::qtty::{Degrees, Radian};

use crate::astro::Astrometry;
use crate::core::ObservableVector;

/// Fixed apparent magnitudes reported with every row.
pub const MOON_APPARENT_MAGNITUDE: f64 = -12.7;
pub const SUN_APPARENT_MAGNITUDE: f64 = -26.74;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Reference new moon 2000-01-06 18:14 UTC, as Unix milliseconds.
pub const REFERENCE_NEW_MOON_MILLIS: i64 = 947_182_440_000;

pub fn illumination_fraction(phase_angle_deg: f64) -> f64 {
    (1.0 - Degrees::new(phase_angle_deg).to::<Radian>().cos()) / 2.0
}

pub fn crescent_width_deg(illumination_fraction: f64) -> f64 {
    illumination_fraction * 180.0
}

/// Days since the reference new moon.
pub fn moon_age_days(at: &DateTime<Utc>) -> f64 {
    (at.timestamp_millis() - REFERENCE_NEW_MOON_MILLIS) as f64 / MILLIS_PER_DAY
}

/// Complete the observable vector for one instant.
pub fn derive_observables(astrometry: &Astrometry, at: &DateTime<Utc>) -> ObservableVector {
    let illumination = illumination_fraction(astrometry.phase_angle_deg);

    ObservableVector {
        sun_altitude_deg: astrometry.sun_altitude_deg,
        moon_altitude_deg: astrometry.moon_altitude_deg,
        moon_sun_separation_deg: astrometry.separation_deg,
        moon_distance_km: astrometry.moon_distance_km,
        sun_distance_km: astrometry.sun_distance_km,
        moon_phase_angle_deg: astrometry.phase_angle_deg,
        moon_illumination_fraction: illumination,
        moon_crescent_width_deg: crescent_width_deg(illumination),
        moon_age_days: moon_age_days(at),
        moon_apparent_magnitude: MOON_APPARENT_MAGNITUDE,
        sun_apparent_magnitude: SUN_APPARENT_MAGNITUDE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_illumination_endpoints() {
        assert_eq!(illumination_fraction(0.0), 0.0);
        assert_eq!(illumination_fraction(180.0), 1.0);
        assert_abs_diff_eq!(illumination_fraction(90.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(illumination_fraction(360.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moon_age_at_reference_is_zero() {
        let reference = Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0).unwrap();
        assert_eq!(moon_age_days(&reference), 0.0);
    }

    #[test]
    fn test_moon_age_is_continuous_and_unwrapped() {
        let later = Utc.with_ymd_and_hms(2000, 2, 6, 18, 14, 0).unwrap();
        assert_abs_diff_eq!(moon_age_days(&later), 31.0, epsilon = 1e-12);

        let earlier = Utc.with_ymd_and_hms(2000, 1, 5, 18, 14, 0).unwrap();
        assert_abs_diff_eq!(moon_age_days(&earlier), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_derive_observables_passes_through_and_derives() {
        let astrometry = Astrometry {
            sun_altitude_deg: -0.9,
            moon_altitude_deg: 8.0,
            moon_distance_km: 395_000.0,
            sun_distance_km: 149_300_000.0,
            separation_deg: 12.5,
            phase_angle_deg: 12.0,
        };
        let at = Utc.with_ymd_and_hms(2025, 3, 30, 8, 20, 0).unwrap();
        let obs = derive_observables(&astrometry, &at);

        assert_eq!(obs.moon_altitude_deg, 8.0);
        assert_eq!(obs.moon_sun_separation_deg, 12.5);
        assert_eq!(obs.moon_phase_angle_deg, 12.0);
        assert_eq!(obs.moon_crescent_width_deg, obs.moon_illumination_fraction * 180.0);
        assert_eq!(obs.moon_apparent_magnitude, -12.7);
        assert_eq!(obs.sun_apparent_magnitude, -26.74);
        assert!(obs.moon_age_days > 9000.0);
    }

    proptest! {
        #[test]
        fn prop_illumination_bounded(phase in 0.0f64..=360.0) {
            let f = illumination_fraction(phase);
            prop_assert!((0.0..=1.0).contains(&f));
        }

        #[test]
        fn prop_crescent_width_is_scaled_illumination(phase in 0.0f64..=360.0) {
            let f = illumination_fraction(phase);
            prop_assert_eq!(crescent_width_deg(f), f * 180.0);
        }
    }
}
