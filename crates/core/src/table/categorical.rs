//! Categorical columns with a fixed category universe
//!
//! Labels are stored as integer codes into a category list. The category
//! list is the *universe* of possible values: it is fixed at construction
//! and survives row filtering, so normalization by the number of possible
//! categories stays correct even when filtered rows omit some of them.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// A column of categorical labels backed by integer codes.
#[derive(Debug, Clone)]
pub struct CategoricalColumn {
    codes: Vec<u32>,
    categories: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl CategoricalColumn {
    /// Build a column from raw label values.
    ///
    /// The category universe is the sorted set of distinct values observed.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();

        let mut categories: Vec<String> = raw.clone();
        categories.sort();
        categories.dedup();

        let lookup: HashMap<String, u32> = categories
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code as u32))
            .collect();

        let codes = raw.iter().map(|v| lookup[v]).collect();

        Self {
            codes,
            categories,
            lookup,
        }
    }

    /// Build a column from raw values against an explicit category universe.
    ///
    /// Use this when the universe is known to be larger than what the rows
    /// contain (e.g. a filtered subset of a full atlas taxonomy).
    pub fn with_universe<I, S>(values: I, categories: Vec<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lookup: HashMap<String, u32> = categories
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code as u32))
            .collect();

        let codes = values
            .into_iter()
            .map(|v| {
                lookup
                    .get(v.as_ref())
                    .copied()
                    .ok_or_else(|| Error::UnknownCategory(v.as_ref().to_string()))
            })
            .collect::<Result<Vec<u32>>>()?;

        Ok(Self {
            codes,
            categories,
            lookup,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Size of the category universe (including unobserved categories).
    pub fn n_categories(&self) -> usize {
        self.categories.len()
    }

    /// Code of the i-th row.
    pub fn code(&self, i: usize) -> u32 {
        self.codes[i]
    }

    /// Label of the i-th row.
    pub fn label(&self, i: usize) -> &str {
        &self.categories[self.codes[i] as usize]
    }

    /// Name of a category by code.
    pub fn category(&self, code: u32) -> &str {
        &self.categories[code as usize]
    }

    /// Code for a category name, if it is in the universe.
    pub fn code_of(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    /// All row codes.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// The category universe, in code order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Occurrence count per category code over all rows.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.categories.len()];
        for &code in &self.codes {
            counts[code as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_is_sorted_distinct() {
        let col = CategoricalColumn::from_values(["b", "a", "b", "c"]);
        assert_eq!(col.categories(), &["a", "b", "c"]);
        assert_eq!(col.len(), 4);
        assert_eq!(col.n_categories(), 3);
        assert_eq!(col.label(0), "b");
        assert_eq!(col.label(1), "a");
    }

    #[test]
    fn explicit_universe_survives_filtering() {
        let universe: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let col = CategoricalColumn::with_universe(["a", "a", "b"], universe).unwrap();
        assert_eq!(col.n_categories(), 4);
        let counts = col.counts();
        assert_eq!(counts, vec![2, 1, 0, 0]);
    }

    #[test]
    fn value_outside_universe_errors() {
        let universe: Vec<String> = vec!["a".to_string()];
        let err = CategoricalColumn::with_universe(["a", "z"], universe).unwrap_err();
        assert!(matches!(err, Error::UnknownCategory(v) if v == "z"));
    }

    #[test]
    fn counts_tally_all_rows() {
        let col = CategoricalColumn::from_values(["x", "y", "x", "x"]);
        assert_eq!(col.counts(), vec![3, 1]);
        assert_eq!(col.code_of("y"), Some(1));
        assert_eq!(col.code_of("q"), None);
    }
}
