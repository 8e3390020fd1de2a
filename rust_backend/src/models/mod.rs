//! Visibility model registry.
//!
//! The five supported criteria form a closed enumeration. Selecting models by
//! name goes through [`VisibilityModel::from_str`], so an unknown name is a
//! configuration error raised while the run is being configured, never during
//! the sweep.
//!
//! # Example
//!
//! ```
//! use crescent_vis::models::{ModelInputs, ModelSelection, VisibilityModel};
//!
//! let selection = ModelSelection::parse(["ilyas", "yallop"]).unwrap();
//! let inputs = ModelInputs {
//!     moon_altitude_deg: 12.0,
//!     sun_altitude_deg: -1.0,
//!     separation_deg: 13.0,
//!     moon_age_days: 1.2,
//!     lag_minutes: 48.0,
//! };
//! let verdict = VisibilityModel::Ilyas.evaluate(&inputs);
//! assert_eq!((verdict.score, verdict.label), (2, "Visible"));
//! assert_eq!(selection.len(), 2);
//! ```

pub mod criteria;
pub mod encoding;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{ModelVerdict, ModelVerdicts, ObservableVector};
use crate::error::{CrescentError, CrescentResult};

pub use encoding::encode_label;

/// The subset of observables a model may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInputs {
    pub moon_altitude_deg: f64,
    pub sun_altitude_deg: f64,
    /// Elongation; also used as Yallop's arc of vision.
    pub separation_deg: f64,
    pub moon_age_days: f64,
    /// Sunset → moonset lag for the instant's date, 0 when unknown.
    pub lag_minutes: f64,
}

impl ModelInputs {
    pub fn from_observables(observables: &ObservableVector, lag_minutes: f64) -> Self {
        Self {
            moon_altitude_deg: observables.moon_altitude_deg,
            sun_altitude_deg: observables.sun_altitude_deg,
            separation_deg: observables.moon_sun_separation_deg,
            moon_age_days: observables.moon_age_days,
            lag_minutes,
        }
    }

    /// Moon altitude minus Sun altitude.
    pub fn diff_alt_deg(&self) -> f64 {
        self.moon_altitude_deg - self.sun_altitude_deg
    }
}

/// A named crescent visibility criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisibilityModel {
    Ilyas,
    Yallop,
    Odeh,
    Shaukat,
    Saao,
}

impl VisibilityModel {
    pub const ALL: [VisibilityModel; 5] = [
        VisibilityModel::Ilyas,
        VisibilityModel::Yallop,
        VisibilityModel::Odeh,
        VisibilityModel::Shaukat,
        VisibilityModel::Saao,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VisibilityModel::Ilyas => "ilyas",
            VisibilityModel::Yallop => "yallop",
            VisibilityModel::Odeh => "odeh",
            VisibilityModel::Shaukat => "shaukat",
            VisibilityModel::Saao => "saao",
        }
    }

    pub fn evaluate(&self, inputs: &ModelInputs) -> ModelVerdict {
        match self {
            VisibilityModel::Ilyas => {
                criteria::ilyas(inputs.moon_altitude_deg, inputs.separation_deg)
            }
            VisibilityModel::Yallop => {
                criteria::yallop(inputs.separation_deg, inputs.diff_alt_deg())
            }
            VisibilityModel::Odeh => criteria::odeh(inputs.separation_deg, inputs.moon_age_days),
            VisibilityModel::Shaukat => criteria::shaukat(
                inputs.separation_deg,
                inputs.moon_altitude_deg,
                inputs.moon_age_days,
            ),
            VisibilityModel::Saao => criteria::saao(inputs.moon_age_days, inputs.lag_minutes),
        }
    }

    pub fn score_column(&self) -> String {
        format!("{}_score", self.name())
    }

    pub fn label_column(&self) -> String {
        format!("{}_label", self.name())
    }
}

impl fmt::Display for VisibilityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VisibilityModel {
    type Err = CrescentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        VisibilityModel::ALL
            .into_iter()
            .find(|model| model.name() == name)
            .ok_or_else(|| {
                CrescentError::config(format!(
                    "unknown visibility model '{}'. Use one of: ilyas, yallop, odeh, shaukat, saao",
                    s
                ))
            })
    }
}

impl Serialize for VisibilityModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for VisibilityModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A validated, non-empty, duplicate-free list of models in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection(Vec<VisibilityModel>);

impl ModelSelection {
    /// Builds a selection; later duplicates are dropped.
    pub fn new(models: impl IntoIterator<Item = VisibilityModel>) -> CrescentResult<Self> {
        let mut selected: Vec<VisibilityModel> = Vec::new();
        for model in models {
            if selected.contains(&model) {
                log::warn!("Visibility model '{}' requested more than once", model);
                continue;
            }
            selected.push(model);
        }
        if selected.is_empty() {
            return Err(CrescentError::config(
                "at least one visibility model must be selected",
            ));
        }
        Ok(Self(selected))
    }

    /// Parses model names, failing on the first unknown one.
    pub fn parse<I, S>(names: I) -> CrescentResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let models = names
            .into_iter()
            .map(|name| name.as_ref().parse::<VisibilityModel>())
            .collect::<CrescentResult<Vec<_>>>()?;
        Self::new(models)
    }

    pub fn all() -> Self {
        Self(VisibilityModel::ALL.to_vec())
    }

    pub fn models(&self) -> &[VisibilityModel] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisibilityModel> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Runs every selected model against the same inputs.
    pub fn evaluate(&self, inputs: &ModelInputs) -> ModelVerdicts {
        self.0
            .iter()
            .map(|model| (*model, model.evaluate(inputs)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(moon_alt: f64, sun_alt: f64, sep: f64, age: f64, lag: f64) -> ModelInputs {
        ModelInputs {
            moon_altitude_deg: moon_alt,
            sun_altitude_deg: sun_alt,
            separation_deg: sep,
            moon_age_days: age,
            lag_minutes: lag,
        }
    }

    #[test]
    fn test_model_names_roundtrip() {
        for model in VisibilityModel::ALL {
            assert_eq!(model.name().parse::<VisibilityModel>().unwrap(), model);
        }
        assert_eq!(" YALLOP ".parse::<VisibilityModel>().unwrap(), VisibilityModel::Yallop);
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let err = "danjon".parse::<VisibilityModel>().unwrap_err();
        assert!(err.is_configuration());
        assert!(ModelSelection::parse(["ilyas", "danjon"]).is_err());
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let names: [&str; 0] = [];
        let err = ModelSelection::parse(names).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_selection_keeps_order_and_drops_duplicates() {
        let selection = ModelSelection::parse(["saao", "ilyas", "saao"]).unwrap();
        assert_eq!(
            selection.models(),
            &[VisibilityModel::Saao, VisibilityModel::Ilyas]
        );
    }

    #[test]
    fn test_yallop_uses_altitude_difference() {
        let verdict = VisibilityModel::Yallop.evaluate(&inputs(3.0, -2.0, 15.0, 1.0, 0.0));
        assert_eq!(verdict.score, 6);
        let verdict = VisibilityModel::Yallop.evaluate(&inputs(3.0, 0.0, 15.0, 1.0, 0.0));
        assert_eq!(verdict.score, 5);
    }

    #[test]
    fn test_selection_evaluates_in_order() {
        let selection = ModelSelection::all();
        let verdicts = selection.evaluate(&inputs(12.0, -1.0, 13.0, 21.0, 45.0));
        let names: Vec<_> = verdicts.iter().map(|(m, _)| m.name()).collect();
        assert_eq!(names, vec!["ilyas", "yallop", "odeh", "shaukat", "saao"]);
        assert_eq!(verdicts.get(VisibilityModel::Saao).unwrap().score, 2);
        assert_eq!(verdicts.get(VisibilityModel::Odeh).unwrap().label, "Easily Visible");
    }

    #[test]
    fn test_extreme_inputs_reach_top_tier() {
        let verdicts = ModelSelection::all().evaluate(&inputs(90.0, -90.0, 180.0, 1e6, 1e6));
        let scores: Vec<(&str, u8)> = verdicts.iter().map(|(m, v)| (m.name(), v.score)).collect();
        assert_eq!(
            scores,
            vec![("ilyas", 2), ("yallop", 6), ("odeh", 2), ("shaukat", 2), ("saao", 2)]
        );
    }

    proptest! {
        #[test]
        fn prop_scores_monotonic_in_every_input(
            moon_alt in -10.0f64..40.0,
            sun_alt in -20.0f64..5.0,
            sep in 0.0f64..40.0,
            age in -5.0f64..40.0,
            lag in -100.0f64..200.0,
            bump in 0.0f64..15.0,
            which in 0usize..5,
        ) {
            let base = inputs(moon_alt, sun_alt, sep, age, lag);
            let mut raised = base;
            match which {
                0 => raised.moon_altitude_deg += bump,
                1 => raised.separation_deg += bump,
                2 => raised.moon_age_days += bump,
                3 => raised.lag_minutes += bump,
                _ => raised.sun_altitude_deg -= bump,
            }
            for model in VisibilityModel::ALL {
                prop_assert!(model.evaluate(&raised).score >= model.evaluate(&base).score);
            }
        }
    }
}
