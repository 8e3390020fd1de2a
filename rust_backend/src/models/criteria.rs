//! Published crescent visibility criteria.
//!
//! Each function is total over finite inputs, has no state and returns the
//! first tier whose condition holds. All comparisons are strict except the
//! `<` rejections in [`odeh`]. Thresholds are fixed literature cutoffs.

use crate::core::ModelVerdict;

/// Ilyas: lunar altitude and elongation.
pub fn ilyas(moon_alt_deg: f64, elongation_deg: f64) -> ModelVerdict {
    if moon_alt_deg > 10.0 && elongation_deg > 11.0 {
        ModelVerdict::new(2, "Visible")
    } else if moon_alt_deg > 5.0 && elongation_deg > 8.0 {
        ModelVerdict::new(1, "Marginal")
    } else {
        ModelVerdict::new(0, "Not Visible")
    }
}

/// Yallop: arc of vision (taken as the Sun-Moon separation) and the
/// Moon-minus-Sun altitude difference. Only tier A looks at `diff_alt_deg`.
pub fn yallop(arc_v_deg: f64, diff_alt_deg: f64) -> ModelVerdict {
    if arc_v_deg > 14.8 && diff_alt_deg > 4.1 {
        ModelVerdict::new(6, "A: Easily visible")
    } else if arc_v_deg > 12.1 {
        ModelVerdict::new(5, "B: Visible under perfect conditions")
    } else if arc_v_deg > 10.5 {
        ModelVerdict::new(4, "C: May need optical aid")
    } else if arc_v_deg > 9.5 {
        ModelVerdict::new(3, "D: Will need optical aid")
    } else if arc_v_deg > 8.4 {
        ModelVerdict::new(2, "E: Visible with telescope")
    } else if arc_v_deg > 7.0 {
        ModelVerdict::new(1, "F: Only photographic")
    } else {
        ModelVerdict::new(0, "G: Not visible")
    }
}

/// Odeh: elongation and moon age.
pub fn odeh(elongation_deg: f64, moon_age_days: f64) -> ModelVerdict {
    if elongation_deg < 8.0 || moon_age_days < 15.0 {
        ModelVerdict::new(0, "Not Visible")
    } else if elongation_deg > 10.0 && moon_age_days > 20.0 {
        ModelVerdict::new(2, "Easily Visible")
    } else {
        ModelVerdict::new(1, "Possibly Visible")
    }
}

/// Shaukat: elongation, lunar altitude and moon age.
pub fn shaukat(elongation_deg: f64, moon_alt_deg: f64, moon_age_days: f64) -> ModelVerdict {
    if moon_alt_deg > 10.0 && elongation_deg > 12.0 && moon_age_days > 20.0 {
        ModelVerdict::new(2, "Visible")
    } else if moon_alt_deg > 6.0 && elongation_deg > 9.0 && moon_age_days > 16.0 {
        ModelVerdict::new(1, "Marginal")
    } else {
        ModelVerdict::new(0, "Not Visible")
    }
}

/// SAAO: moon age and the sunset → moonset lag.
pub fn saao(moon_age_days: f64, lag_minutes: f64) -> ModelVerdict {
    if moon_age_days > 20.0 && lag_minutes > 40.0 {
        ModelVerdict::new(2, "Visible")
    } else if moon_age_days > 15.0 && lag_minutes > 30.0 {
        ModelVerdict::new(1, "Marginal")
    } else {
        ModelVerdict::new(0, "Not Visible")
    }
}
