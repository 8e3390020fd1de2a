//! Core domain models for crescent visibility runs.
//!
//! This module defines the data structures shared by the sweep engine, the
//! model registry and the output writers: observer locations, per-day rise/set
//! events, evaluation instants, per-instant observables and result rows.

pub mod domain;

pub use domain::{
    DayEvents, EvaluationInstant, EventKind, InstantKind, ModelVerdict, ModelVerdicts,
    ObservableVector, ObserverLocation, ResultRow,
};
