//! Service layer: observable derivation, the date sweep and result aggregation.
//!
//! These sit between the astronomy provider and the output writers. Nothing
//! here touches the filesystem.

pub mod aggregation;
pub mod derivation;
pub mod sweep;

pub use aggregation::{composite_score, FieldSeries, ResultTable, COMMON_COLUMNS};
pub use derivation::{
    crescent_width_deg, derive_observables, illumination_fraction, moon_age_days,
    MOON_APPARENT_MAGNITUDE, SUN_APPARENT_MAGNITUDE,
};
pub use sweep::{build_instants, SweepConfig, SweepEngine, SweepMode};
