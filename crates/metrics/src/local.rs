//! Local (neighborhood) metric engine
//!
//! Computes a diversity statistic over each cell's k-nearest spatial
//! neighborhood, for each taxonomy level. Per-cell computations are
//! independent and run across all cores; results are collected in input
//! row order.

use ndarray::Array2;
use rayon::prelude::*;

use cellscape_core::{CellTable, Error, LocalMetrics, Result, TaxonomyLevel};

use crate::diversity::DiversityStat;
use crate::kdtree::KdTree3;

/// Parameters for the local metric engine.
#[derive(Debug, Clone)]
pub struct LocalMetricParams {
    /// Neighborhood size. The query pool includes the cell itself, so a
    /// cell's own label counts toward its neighborhood statistic.
    pub n_neighbors: usize,
    /// Taxonomy levels to compute the statistic for.
    pub levels: Vec<TaxonomyLevel>,
}

impl Default for LocalMetricParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            levels: TaxonomyLevel::ALL.to_vec(),
        }
    }
}

/// The statistic over one cell's neighborhood, one value per level.
///
/// Free function with no captured state: workers share only read-only
/// references to the tree, the cell table and the neighbor codes.
fn neighborhood_record(
    cell: usize,
    tree: &KdTree3,
    coords: &[[f64; 3]],
    level_codes: &[&[u32]],
    stat: DiversityStat,
    k: usize,
) -> Result<Vec<f64>> {
    let neighbors = tree.k_nearest(coords[cell], k);

    level_codes
        .iter()
        .map(|codes| {
            let sample: Vec<u32> = neighbors.iter().map(|n| codes[n.index]).collect();
            stat.evaluate(&sample)
        })
        .collect()
}

/// Compute a statistic over every cell's k-nearest-neighbor set.
///
/// Builds a k-d tree over the 3D CCF coordinates, queries each cell's
/// `n_neighbors` nearest cells (Euclidean), and evaluates `stat` over the
/// neighbor labels for each requested level. Output rows match the input
/// table's order exactly; columns are named `"local_{metric_name}_{level}"`.
///
/// Fails fast: an error in any cell's computation aborts the whole call.
pub fn local_metric(
    cells: &CellTable,
    stat: DiversityStat,
    metric_name: &str,
    params: &LocalMetricParams,
) -> Result<LocalMetrics> {
    if params.n_neighbors == 0 {
        return Err(Error::InvalidParameter {
            name: "n_neighbors",
            value: "0".to_string(),
            reason: "neighborhood must contain at least one cell".to_string(),
        });
    }

    let coords = cells.coords()?;
    let level_codes: Vec<&[u32]> = params
        .levels
        .iter()
        .map(|&level| cells.level(level).map(|col| col.codes()))
        .collect::<Result<_>>()?;

    let tree = KdTree3::build(coords);

    let rows: Vec<Vec<f64>> = (0..cells.len())
        .into_par_iter()
        .map(|cell| {
            neighborhood_record(cell, &tree, coords, &level_codes, stat, params.n_neighbors)
        })
        .collect::<Result<_>>()?;

    let columns: Vec<String> = params
        .levels
        .iter()
        .map(|level| format!("local_{metric_name}_{level}"))
        .collect();

    let mut data = Array2::zeros((cells.len(), columns.len()));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            data[(i, j)] = value;
        }
    }

    LocalMetrics::new(columns, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellscape_core::{CategoricalColumn, CellTable};

    /// Two well-separated blobs of 5 cells: one pure c1, one mixed.
    fn blob_table() -> CellTable {
        let mut regions = Vec::new();
        let mut clusters = Vec::new();
        let mut coords = Vec::new();

        for i in 0..5 {
            regions.push("A");
            clusters.push("c1");
            coords.push([i as f64 * 0.1, 0.0, 0.0]);
        }
        for i in 0..5 {
            regions.push("B");
            clusters.push(if i % 2 == 0 { "c2" } else { "c3" });
            coords.push([100.0 + i as f64 * 0.1, 0.0, 0.0]);
        }

        CellTable::from_columns(
            CategoricalColumn::from_values(regions),
            vec![(
                TaxonomyLevel::Cluster,
                CategoricalColumn::from_values(clusters),
            )],
            Some(coords),
        )
        .unwrap()
    }

    fn cluster_params(k: usize) -> LocalMetricParams {
        LocalMetricParams {
            n_neighbors: k,
            levels: vec![TaxonomyLevel::Cluster],
        }
    }

    #[test]
    fn output_matches_input_order_and_length() {
        let cells = blob_table();
        let result =
            local_metric(&cells, DiversityStat::CountUnique, "count", &cluster_params(5)).unwrap();

        assert_eq!(result.n_cells(), cells.len());
        assert_eq!(result.columns(), &["local_count_cluster"]);

        let col = result.column("local_count_cluster").unwrap();
        // First blob is pure c1: all 5 neighbors share one label.
        for i in 0..5 {
            assert_eq!(col[i], 1.0, "cell {i} in the pure blob");
        }
        // Second blob alternates c2/c3.
        for i in 5..10 {
            assert_eq!(col[i], 2.0, "cell {i} in the mixed blob");
        }
    }

    #[test]
    fn missing_coordinates_error() {
        let regions = CategoricalColumn::from_values(["A", "B"]);
        let clusters = CategoricalColumn::from_values(["c1", "c2"]);
        let cells =
            CellTable::from_columns(regions, vec![(TaxonomyLevel::Cluster, clusters)], None)
                .unwrap();

        let err =
            local_metric(&cells, DiversityStat::CountUnique, "count", &cluster_params(3))
                .unwrap_err();
        assert!(matches!(err, Error::MissingCoordinates));
    }

    #[test]
    fn zero_neighbors_rejected() {
        let cells = blob_table();
        let err =
            local_metric(&cells, DiversityStat::Shannon, "shannon_index", &cluster_params(0))
                .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "n_neighbors", .. }));
    }

    #[test]
    fn shannon_zero_in_uniform_neighborhood() {
        let cells = blob_table();
        let result = local_metric(
            &cells,
            DiversityStat::Shannon,
            "shannon_index",
            &cluster_params(5),
        )
        .unwrap();

        let col = result.column("local_shannon_index_cluster").unwrap();
        for i in 0..5 {
            assert_eq!(col[i], 0.0);
        }
        // Alternating c2/c3 neighborhoods of 5: p = [3/5, 2/5] or [2/5, 3/5]
        let expected = -(0.6f64 * 0.6f64.log2() + 0.4 * 0.4f64.log2());
        for i in 5..10 {
            assert!((col[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn neighborhood_includes_self() {
        // A lone far-away cell with k=1 sees only itself.
        let regions = CategoricalColumn::from_values(["A", "A", "B"]);
        let clusters = CategoricalColumn::from_values(["c1", "c1", "c2"]);
        let coords = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [1000.0, 0.0, 0.0]];
        let cells = CellTable::from_columns(
            regions,
            vec![(TaxonomyLevel::Cluster, clusters)],
            Some(coords),
        )
        .unwrap();

        let result =
            local_metric(&cells, DiversityStat::CountUnique, "count", &cluster_params(1)).unwrap();
        let col = result.column("local_count_cluster").unwrap();
        assert_eq!(col[2], 1.0);
    }
}
