//! Region metric engine
//!
//! Groups cells by CCF region and computes a diversity statistic per
//! taxonomy level, yielding a wide per-region [`MetricTable`].

use std::collections::HashSet;

use ndarray::Array2;

use cellscape_core::{CellTable, MetricTable, Result, TaxonomyLevel};

use crate::diversity::DiversityStat;

/// Region labels treated as unassigned and excluded by default.
pub const DEFAULT_EXCLUDE: &[&str] = &["unassigned", "TH-unassigned"];

/// Parameters for the region metric engine.
#[derive(Debug, Clone)]
pub struct RegionMetricParams {
    /// Region labels to drop before grouping.
    pub exclude: Vec<String>,
    /// Taxonomy levels to compute the statistic for.
    pub levels: Vec<TaxonomyLevel>,
}

impl Default for RegionMetricParams {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            levels: TaxonomyLevel::ALL.to_vec(),
        }
    }
}

/// Row indices grouped by region, excluded regions dropped, sorted by
/// region label. Every group is non-empty by construction.
fn region_groups(cells: &CellTable, exclude: &[String]) -> Vec<(String, Vec<usize>)> {
    let region = cells.region();

    let excluded: HashSet<u32> = exclude
        .iter()
        .filter_map(|name| region.code_of(name))
        .collect();

    // Category codes are assigned in sorted label order, so grouping by
    // code yields lexicographically ordered regions.
    let mut rows_by_code: Vec<Vec<usize>> = vec![Vec::new(); region.n_categories()];
    for i in 0..region.len() {
        let code = region.code(i);
        if !excluded.contains(&code) {
            rows_by_code[code as usize].push(i);
        }
    }

    rows_by_code
        .into_iter()
        .enumerate()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(code, rows)| (region.category(code as u32).to_string(), rows))
        .collect()
}

/// Compute one statistic per (region, taxonomy level) pair.
///
/// Rows whose region label is in `params.exclude` are dropped first; the
/// output has one row per remaining region (sorted by label) and one
/// column per level, named `"{metric_name}_{level}"`.
///
/// When `norm` is supplied, each column is divided by `norm` evaluated
/// over the *entire unfiltered* level column, a global scalar, yielding
/// "fraction of all categories found in this region" style metrics.
pub fn region_metric(
    cells: &CellTable,
    stat: DiversityStat,
    metric_name: &str,
    params: &RegionMetricParams,
    norm: Option<DiversityStat>,
) -> Result<MetricTable> {
    let groups = region_groups(cells, &params.exclude);

    let regions: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let columns: Vec<String> = params
        .levels
        .iter()
        .map(|level| format!("{metric_name}_{level}"))
        .collect();

    let mut data = Array2::zeros((groups.len(), params.levels.len()));

    for (j, &level) in params.levels.iter().enumerate() {
        let codes = cells.level(level)?.codes();

        let norm_value = match norm {
            Some(norm_stat) => norm_stat.evaluate(codes)?,
            None => 1.0,
        };

        for (i, (_, rows)) in groups.iter().enumerate() {
            let sample: Vec<u32> = rows.iter().map(|&r| codes[r]).collect();
            data[(i, j)] = stat.evaluate(&sample)? / norm_value;
        }
    }

    MetricTable::new(regions, columns, data)
}

/// Compute the full battery of per-region diversity metrics.
///
/// Columns, per taxonomy level:
/// - `count`: unique categories found in the region
/// - `frac`: `count` as a fraction of all categories in the dataset
/// - `count_norm2cells`: unique categories per cell in the region
/// - `count_gt5`: unique categories with more than 5 cells
/// - `frac_gt5`: `count_gt5` as a fraction of all categories
/// - `inverse_simpsons`: inverse Simpson's diversity index
/// - `shannon_index`: Shannon diversity index (base 2)
///
/// plus a raw `count_cells` column with the number of cells per region.
pub fn diversity_metrics(cells: &CellTable, params: &RegionMetricParams) -> Result<MetricTable> {
    use DiversityStat::*;

    let mut tables = vec![
        region_metric(cells, CountUnique, "count", params, None)?,
        region_metric(cells, CountUnique, "frac", params, Some(CountUnique))?,
        region_metric(cells, CountUniqueNorm, "count_norm2cells", params, None)?,
        region_metric(cells, CountGtThreshold, "count_gt5", params, None)?,
        region_metric(cells, CountGtThreshold, "frac_gt5", params, Some(CountUnique))?,
        region_metric(cells, InverseSimpson, "inverse_simpsons", params, None)?,
        region_metric(cells, Shannon, "shannon_index", params, None)?,
    ];

    let groups = region_groups(cells, &params.exclude);
    let regions: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let counts = Array2::from_shape_vec(
        (groups.len(), 1),
        groups.iter().map(|(_, rows)| rows.len() as f64).collect(),
    )
    .map_err(|e| cellscape_core::Error::ShapeMismatch(e.to_string()))?;

    tables.push(MetricTable::new(
        regions,
        vec!["count_cells".to_string()],
        counts,
    )?);

    MetricTable::concat(tables)
}
