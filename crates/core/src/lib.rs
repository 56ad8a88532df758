//! # Cellscape Core
//!
//! Core types for per-region diversity analysis of spatial cell data.
//!
//! This crate provides:
//! - `CellTable`: the observation table (one row per cell, with CCF region
//!   labels, taxonomy labels and optional 3D coordinates)
//! - `CategoricalColumn`: integer-coded labels with a fixed category universe
//! - `MetricTable` / `LocalMetrics` / `ProportionTable`: derived output tables
//! - `TaxonomyLevel`: the cluster/supertype/subclass hierarchy

pub mod error;
pub mod table;
pub mod taxonomy;

pub use error::{Error, Result};
pub use table::{
    CategoricalColumn, CellRecord, CellTable, CellTableBuilder, LocalMetrics, MetricTable,
    ProportionTable, OTHER_CATEGORY,
};
pub use taxonomy::TaxonomyLevel;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::table::{
        CategoricalColumn, CellRecord, CellTable, CellTableBuilder, LocalMetrics, MetricTable,
        ProportionTable, OTHER_CATEGORY,
    };
    pub use crate::taxonomy::TaxonomyLevel;
}
