//! The observation table: one row per cell

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::table::categorical::CategoricalColumn;
use crate::taxonomy::TaxonomyLevel;

/// A table of cell observations.
///
/// Each row is one cell with an anatomical (CCF) region label, one
/// categorical taxonomy label per available level, and optionally a 3D
/// position in CCF coordinate space. All columns have the same length;
/// coordinates are present for all cells or for none.
#[derive(Debug, Clone)]
pub struct CellTable {
    region: CategoricalColumn,
    levels: BTreeMap<TaxonomyLevel, CategoricalColumn>,
    coords: Option<Vec<[f64; 3]>>,
}

impl CellTable {
    /// Assemble a table from whole columns.
    pub fn from_columns(
        region: CategoricalColumn,
        levels: Vec<(TaxonomyLevel, CategoricalColumn)>,
        coords: Option<Vec<[f64; 3]>>,
    ) -> Result<Self> {
        let n = region.len();

        let mut level_map = BTreeMap::new();
        for (level, column) in levels {
            if column.len() != n {
                return Err(Error::LengthMismatch {
                    expected: n,
                    actual: column.len(),
                });
            }
            level_map.insert(level, column);
        }

        if let Some(ref xyz) = coords {
            if xyz.len() != n {
                return Err(Error::LengthMismatch {
                    expected: n,
                    actual: xyz.len(),
                });
            }
        }

        Ok(Self {
            region,
            levels: level_map,
            coords,
        })
    }

    /// Start building a table row by row.
    pub fn builder() -> CellTableBuilder {
        CellTableBuilder::default()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Whether the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// The CCF region column.
    pub fn region(&self) -> &CategoricalColumn {
        &self.region
    }

    /// The label column for a taxonomy level.
    pub fn level(&self, level: TaxonomyLevel) -> Result<&CategoricalColumn> {
        self.levels
            .get(&level)
            .ok_or_else(|| Error::MissingLevel(level.to_string()))
    }

    /// Levels present in the table.
    pub fn levels(&self) -> impl Iterator<Item = TaxonomyLevel> + '_ {
        self.levels.keys().copied()
    }

    /// 3D CCF coordinates of all cells.
    pub fn coords(&self) -> Result<&[[f64; 3]]> {
        self.coords
            .as_deref()
            .ok_or(Error::MissingCoordinates)
    }

    /// Whether cells carry spatial coordinates.
    pub fn has_coords(&self) -> bool {
        self.coords.is_some()
    }
}

/// One cell observation, as fed to [`CellTableBuilder::push`].
#[derive(Debug, Clone, Default)]
pub struct CellRecord {
    pub region: String,
    pub cluster: Option<String>,
    pub supertype: Option<String>,
    pub subclass: Option<String>,
    pub coords: Option<[f64; 3]>,
}

/// Row-wise builder for [`CellTable`].
#[derive(Debug, Default)]
pub struct CellTableBuilder {
    regions: Vec<String>,
    clusters: Vec<String>,
    supertypes: Vec<String>,
    subclasses: Vec<String>,
    coords: Vec<[f64; 3]>,
    rows: usize,
}

impl CellTableBuilder {
    /// Append one cell. Per-level labels and coordinates must be supplied
    /// for every cell or for none; `build` rejects mixed rows.
    pub fn push(&mut self, record: CellRecord) {
        self.regions.push(record.region);
        if let Some(v) = record.cluster {
            self.clusters.push(v);
        }
        if let Some(v) = record.supertype {
            self.supertypes.push(v);
        }
        if let Some(v) = record.subclass {
            self.subclasses.push(v);
        }
        if let Some(xyz) = record.coords {
            self.coords.push(xyz);
        }
        self.rows += 1;
    }

    pub fn build(self) -> Result<CellTable> {
        let n = self.rows;
        let mut levels = Vec::new();

        for (level, values) in [
            (TaxonomyLevel::Cluster, self.clusters),
            (TaxonomyLevel::Supertype, self.supertypes),
            (TaxonomyLevel::Subclass, self.subclasses),
        ] {
            if values.is_empty() {
                continue;
            }
            if values.len() != n {
                return Err(Error::LengthMismatch {
                    expected: n,
                    actual: values.len(),
                });
            }
            levels.push((level, CategoricalColumn::from_values(values)));
        }

        let coords = if self.coords.is_empty() {
            None
        } else if self.coords.len() == n {
            Some(self.coords)
        } else {
            return Err(Error::LengthMismatch {
                expected: n,
                actual: self.coords.len(),
            });
        };

        CellTable::from_columns(CategoricalColumn::from_values(self.regions), levels, coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, cluster: &str) -> CellRecord {
        CellRecord {
            region: region.to_string(),
            cluster: Some(cluster.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn builder_assembles_columns() {
        let mut builder = CellTable::builder();
        builder.push(record("A", "c1"));
        builder.push(record("A", "c2"));
        builder.push(record("B", "c1"));

        let cells = builder.build().unwrap();
        assert_eq!(cells.len(), 3);
        assert!(!cells.has_coords());
        assert_eq!(cells.region().label(2), "B");
        assert_eq!(cells.levels().collect::<Vec<_>>(), vec![TaxonomyLevel::Cluster]);
        assert!(cells.level(TaxonomyLevel::Subclass).is_err());
    }

    #[test]
    fn builder_rejects_partial_level() {
        let mut builder = CellTable::builder();
        builder.push(record("A", "c1"));
        builder.push(CellRecord {
            region: "A".to_string(),
            ..Default::default()
        });

        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn builder_rejects_partial_coords() {
        let mut builder = CellTable::builder();
        builder.push(CellRecord {
            region: "A".to_string(),
            coords: Some([0.0, 0.0, 0.0]),
            ..Default::default()
        });
        builder.push(CellRecord {
            region: "B".to_string(),
            ..Default::default()
        });

        assert!(builder.build().is_err());
    }

    #[test]
    fn missing_coords_is_recognizable() {
        let mut builder = CellTable::builder();
        builder.push(record("A", "c1"));
        let cells = builder.build().unwrap();
        assert!(matches!(cells.coords(), Err(Error::MissingCoordinates)));
    }
}
