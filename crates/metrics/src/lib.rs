//! # Cellscape Metrics
//!
//! Diversity metrics for spatial cell data annotated with CCF regions and
//! taxonomy labels.
//!
//! ## Engines
//!
//! - **region**: per-region diversity metrics (group by CCF region)
//! - **local**: per-cell neighborhood metrics (k-nearest spatial neighbors,
//!   parallel across cells)
//! - **proportions**: region × category proportion tables with an `other`
//!   bucket for rare categories
//! - **diversity**: the underlying statistic formulas (unique counts,
//!   inverse Simpson's, Shannon)

pub mod diversity;
pub mod kdtree;
pub mod local;
pub mod proportions;
pub mod region;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::diversity::{
        count_gt_threshold, count_unique, count_unique_norm, inverse_simpson_index, shannon_index,
        DiversityStat, GT_CELL_THRESHOLD,
    };
    pub use crate::local::{local_metric, LocalMetricParams};
    pub use crate::proportions::{level_proportions, ProportionParams};
    pub use crate::region::{diversity_metrics, region_metric, RegionMetricParams};
    pub use cellscape_core::prelude::*;
}
