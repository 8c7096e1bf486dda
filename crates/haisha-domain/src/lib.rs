//! Domain layer for haisha
//!
//! Pure allocation logic: input normalization, route-to-vehicle matching,
//! duplicate validation, unassigned-vehicle reporting, run summaries, and the
//! append-only ledger writer with its date-section grouping pass.

pub mod model;
pub mod repository;
pub mod service;
