//! Young crescent moon visibility predictions.
//!
//! For each date in a range the sweep engine takes rise/set events and
//! apparent positions from an [`astro::AstronomyProvider`], derives the
//! observables, and classifies every evaluation instant with the selected
//! published criteria (Ilyas, Yallop, Odeh, Shaukat, SAAO). Results are
//! written as CSV, optional JSON and PNG charts.

pub mod app;
pub mod astro;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod models;
pub mod services;
pub mod time;

pub use error::{CrescentError, CrescentResult};
