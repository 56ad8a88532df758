//! Wide output tables for region-wise and cell-wise metrics

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Error, Result};

/// A per-region metrics table.
///
/// One row per CCF region (sorted by label), one column per
/// `"{metric}_{level}"` pair. Values are `f64`; counts are stored as whole
/// numbers in the same matrix.
#[derive(Debug, Clone)]
pub struct MetricTable {
    regions: Vec<String>,
    region_index: HashMap<String, usize>,
    columns: Vec<String>,
    data: Array2<f64>,
}

impl MetricTable {
    /// Build a table from a region index, column names and a data matrix
    /// of shape `(regions, columns)`.
    pub fn new(regions: Vec<String>, columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if data.nrows() != regions.len() || data.ncols() != columns.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} regions x {} columns vs data {:?}",
                regions.len(),
                columns.len(),
                data.dim()
            )));
        }

        let region_index = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();

        Ok(Self {
            regions,
            region_index,
            columns,
            data,
        })
    }

    /// Region labels, in row order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Column names, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of region rows.
    pub fn n_regions(&self) -> usize {
        self.regions.len()
    }

    /// The raw data matrix, shape `(regions, columns)`.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// One column by name.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        Ok(self.data.index_axis(Axis(1), idx))
    }

    /// A single value by region and column name.
    pub fn value(&self, region: &str, column: &str) -> Result<f64> {
        let row = *self
            .region_index
            .get(region)
            .ok_or_else(|| Error::UnknownRegion(region.to_string()))?;
        let col = self.column(column)?;
        Ok(col[row])
    }

    /// Concatenate tables column-wise. All tables must share the same
    /// region index in the same order.
    pub fn concat(tables: Vec<MetricTable>) -> Result<MetricTable> {
        let mut iter = tables.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::Other("concat of zero tables".to_string()))?;

        let mut columns = first.columns;
        let mut data = first.data;

        for table in iter {
            if table.regions != first.regions {
                return Err(Error::ShapeMismatch(
                    "concat requires identical region indexes".to_string(),
                ));
            }
            columns.extend(table.columns);
            data = ndarray::concatenate(Axis(1), &[data.view(), table.data.view()])
                .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
        }

        MetricTable::new(first.regions, columns, data)
    }

    /// Region labels sorted ascending by the named column.
    pub fn regions_sorted_by(&self, column: &str) -> Result<Vec<String>> {
        let col = self.column(column)?;
        let mut order: Vec<usize> = (0..self.regions.len()).collect();
        order.sort_by(|&a, &b| {
            col[a]
                .partial_cmp(&col[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(order.into_iter().map(|i| self.regions[i].clone()).collect())
    }
}

/// Per-cell metrics from the local (neighborhood) engine.
///
/// Row order is identical to the source [`CellTable`](crate::CellTable);
/// columns are named `"local_{metric}_{level}"`.
#[derive(Debug, Clone)]
pub struct LocalMetrics {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl LocalMetrics {
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if data.ncols() != columns.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} columns vs data {:?}",
                columns.len(),
                data.dim()
            )));
        }
        Ok(Self { columns, data })
    }

    /// Number of cell rows.
    pub fn n_cells(&self) -> usize {
        self.data.nrows()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// One column by name.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        Ok(self.data.index_axis(Axis(1), idx))
    }
}
