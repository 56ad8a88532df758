//! Region-by-category proportion tables

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Error, Result};

/// Synthetic category that absorbs below-threshold counts.
pub const OTHER_CATEGORY: &str = "other";

/// A region × category table of cell proportions.
///
/// Each row sums to 1 (modulo floating-point error). Rare categories are
/// collapsed into a trailing [`OTHER_CATEGORY`] column during aggregation;
/// category columns that end up all-zero are dropped.
#[derive(Debug, Clone)]
pub struct ProportionTable {
    regions: Vec<String>,
    region_index: HashMap<String, usize>,
    categories: Vec<String>,
    data: Array2<f64>,
}

impl ProportionTable {
    pub fn new(regions: Vec<String>, categories: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if data.nrows() != regions.len() || data.ncols() != categories.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} regions x {} categories vs data {:?}",
                regions.len(),
                categories.len(),
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
            categories,
            data,
        })
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Proportions for one region, in category order.
    pub fn row(&self, region: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = *self
            .region_index
            .get(region)
            .ok_or_else(|| Error::UnknownRegion(region.to_string()))?;
        Ok(self.data.index_axis(Axis(0), idx))
    }

    /// A single proportion by region and category.
    pub fn value(&self, region: &str, category: &str) -> Result<f64> {
        let row = self.row(region)?;
        let col = self
            .categories
            .iter()
            .position(|c| c == category)
            .ok_or_else(|| Error::UnknownColumn(category.to_string()))?;
        Ok(row[col])
    }

    /// Number of non-zero categories per region, excluding `other`.
    pub fn nonzero_counts(&self) -> Vec<usize> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .zip(&self.categories)
                    .filter(|(&v, c)| v != 0.0 && c.as_str() != OTHER_CATEGORY)
                    .count()
            })
            .collect()
    }

    /// Restrict the table to a subset of regions, keeping the table's row
    /// order, and drop category columns that become all-zero.
    pub fn restrict(&self, keep: &[String]) -> Result<ProportionTable> {
        let rows: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, r)| keep.contains(r))
            .map(|(i, _)| i)
            .collect();

        let regions: Vec<String> = rows.iter().map(|&i| self.regions[i].clone()).collect();
        let data = self.data.select(Axis(0), &rows);

        let cols: Vec<usize> = (0..self.categories.len())
            .filter(|&c| data.index_axis(Axis(1), c).iter().any(|&v| v != 0.0))
            .collect();

        let categories = cols.iter().map(|&c| self.categories[c].clone()).collect();
        let data = data.select(Axis(1), &cols);

        ProportionTable::new(regions, categories, data)
    }

    /// Reorder rows to the given region order. Every name must be a row of
    /// the table.
    pub fn reorder(&self, order: &[String]) -> Result<ProportionTable> {
        let rows = order
            .iter()
            .map(|r| {
                self.region_index
                    .get(r)
                    .copied()
                    .ok_or_else(|| Error::UnknownRegion(r.clone()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let data = self.data.select(Axis(0), &rows);
        ProportionTable::new(order.to_vec(), self.categories.clone(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> ProportionTable {
        ProportionTable::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["c1".to_string(), "c2".to_string(), OTHER_CATEGORY.to_string()],
            array![[0.5, 0.0, 0.5], [1.0, 0.0, 0.0], [0.2, 0.6, 0.2]],
        )
        .unwrap()
    }

    #[test]
    fn nonzero_counts_ignore_other() {
        assert_eq!(sample().nonzero_counts(), vec![1, 1, 2]);
    }

    #[test]
    fn restrict_drops_zero_columns() {
        let t = sample();
        let sub = t
            .restrict(&["A".to_string(), "B".to_string()])
            .unwrap();
        assert_eq!(sub.regions(), &["A", "B"]);
        // c2 is all-zero in A and B
        assert_eq!(sub.categories(), &["c1", OTHER_CATEGORY]);
    }

    #[test]
    fn reorder_rows() {
        let t = sample();
        let r = t
            .reorder(&["C".to_string(), "A".to_string()])
            .unwrap();
        assert_eq!(r.regions(), &["C", "A"]);
        assert_eq!(r.value("C", "c2").unwrap(), 0.6);
        assert!(t.reorder(&["Z".to_string()]).is_err());
    }
}
