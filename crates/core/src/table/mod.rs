//! Tabular types: the cell observation table and derived metric tables

mod categorical;
mod cells;
mod metrics;
mod proportions;

pub use categorical::CategoricalColumn;
pub use cells::{CellRecord, CellTable, CellTableBuilder};
pub use metrics::{LocalMetrics, MetricTable};
pub use proportions::{ProportionTable, OTHER_CATEGORY};
