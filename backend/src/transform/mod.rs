//! Transformation module.
//!
//! This module turns raw census tables into typed records and views:
//! - Clean: column drops, aggregate row filters, numeric coercion
//! - Pipeline: per-table loaders and the state/immigrant views
//! - Crosstab: region x region migration matrix
//! - Lookup: municipality origin breakdown

pub mod clean;
pub mod crosstab;
pub mod lookup;
pub mod pipeline;

pub use crosstab::{CellDisplay, MatrixView, MigrationMatrix};
pub use lookup::{lookup_municipality, municipality_names, MunicipalityProfile, OriginRow};
pub use pipeline::*;
