//! # Cellscape Plots
//!
//! SVG chart generation for per-region diversity results:
//! - dual-axis count/fraction barplots
//! - multi-level metric scatter plots
//! - stacked per-region category proportion barplots
//!
//! Charts render into SVG strings via plotters; callers decide where the
//! output goes.

pub mod charts;
pub mod palette;

pub use charts::{
    barplot_dual_y_count_frac, barplot_stacked_proportions, plot_metric_levels, ChartStyle,
    Orientation, StackedBarParams,
};
pub use palette::{fallback_palette, PaletteBook, PaletteProvider, Rgb, OTHER_COLOR};
