//! Proportion aggregation
//!
//! Cross-tabulates (region, category) counts for one taxonomy level,
//! collapses rare categories into an `other` bucket, and row-normalizes
//! into proportions for stacked barplots.

use ndarray::{Array2, Axis};

use cellscape_core::{CellTable, ProportionTable, Result, TaxonomyLevel, OTHER_CATEGORY};

/// Parameters for proportion aggregation.
#[derive(Debug, Clone)]
pub struct ProportionParams {
    /// Categories at or below this per-region fraction of cells are merged
    /// into `other`.
    pub min_frac: f64,
    /// Absolute count threshold; when set, supersedes `min_frac`.
    pub min_count: Option<u32>,
}

impl Default for ProportionParams {
    fn default() -> Self {
        Self {
            min_frac: 0.01,
            min_count: None,
        }
    }
}

/// Compute per-region category proportions for one taxonomy level.
///
/// 1. Count cells per (region, category) pair; unseen pairs are 0.
/// 2. Mark cells at or below the threshold (`min_count` if set, otherwise
///    the per-region fraction against `min_frac`).
/// 3. Sum marked cells into an `other` column and zero the originals.
/// 4. Drop category columns that are now all-zero.
/// 5. Divide each row by its total, so every region's proportions sum to 1.
pub fn level_proportions(
    cells: &CellTable,
    level: TaxonomyLevel,
    params: &ProportionParams,
) -> Result<ProportionTable> {
    let region = cells.region();
    let labels = cells.level(level)?;

    let n_regions = region.n_categories();
    let n_cats = labels.n_categories();

    let mut counts: Array2<f64> = Array2::zeros((n_regions, n_cats));
    for i in 0..cells.len() {
        counts[(region.code(i) as usize, labels.code(i) as usize)] += 1.0;
    }

    // Regions with no cells have no row in the output.
    let occupied: Vec<usize> = (0..n_regions)
        .filter(|&r| counts.row(r).sum() > 0.0)
        .collect();
    let mut counts = counts.select(Axis(0), &occupied);
    let regions: Vec<String> = occupied
        .iter()
        .map(|&r| region.category(r as u32).to_string())
        .collect();

    // Move below-threshold counts to the `other` bucket.
    let mut other = vec![0.0f64; counts.nrows()];
    for (r, mut row) in counts.axis_iter_mut(Axis(0)).enumerate() {
        let total: f64 = row.sum();
        for value in row.iter_mut() {
            let below = match params.min_count {
                Some(min_count) => *value <= min_count as f64,
                None => *value / total <= params.min_frac,
            };
            if below {
                other[r] += *value;
                *value = 0.0;
            }
        }
    }

    let mut categories: Vec<String> = labels.categories().to_vec();
    categories.push(OTHER_CATEGORY.to_string());
    let other = Array2::from_shape_vec((counts.nrows(), 1), other)
        .map_err(|e| cellscape_core::Error::ShapeMismatch(e.to_string()))?;
    counts = ndarray::concatenate(Axis(1), &[counts.view(), other.view()])
        .map_err(|e| cellscape_core::Error::ShapeMismatch(e.to_string()))?;

    // Drop columns that are all-zero after consolidation.
    let keep: Vec<usize> = (0..counts.ncols())
        .filter(|&c| counts.index_axis(Axis(1), c).iter().any(|&v| v != 0.0))
        .collect();
    let categories: Vec<String> = keep.iter().map(|&c| categories[c].clone()).collect();
    let mut counts = counts.select(Axis(1), &keep);

    // Counts to proportions.
    for mut row in counts.axis_iter_mut(Axis(0)) {
        let total: f64 = row.sum();
        row.mapv_inplace(|v| v / total);
    }

    ProportionTable::new(regions, categories, counts)
}
