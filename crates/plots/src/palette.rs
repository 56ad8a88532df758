//! Categorical color palettes
//!
//! Taxonomy palettes normally come from an external atlas source via the
//! [`PaletteProvider`] seam. When a level has no registered palette, the
//! chart layer falls back to cycling [`CATEGORICAL_PALETTE`], a fixed set
//! of mutually distinguishable colors.

use std::collections::BTreeMap;

use cellscape_core::{Error, Result, TaxonomyLevel, OTHER_CATEGORY};

/// RGB color with components in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Fixed color for the synthetic `other` category.
pub const OTHER_COLOR: Rgb = Rgb::new(211, 211, 211);

/// 32 mutually distinguishable categorical colors, cycled when a level
/// has more categories than entries.
pub const CATEGORICAL_PALETTE: &[Rgb] = &[
    Rgb::new(214, 0, 0),
    Rgb::new(140, 59, 255),
    Rgb::new(1, 135, 0),
    Rgb::new(0, 172, 198),
    Rgb::new(151, 255, 0),
    Rgb::new(255, 126, 209),
    Rgb::new(107, 0, 79),
    Rgb::new(255, 165, 47),
    Rgb::new(0, 0, 156),
    Rgb::new(133, 112, 103),
    Rgb::new(0, 73, 66),
    Rgb::new(79, 42, 0),
    Rgb::new(0, 253, 207),
    Rgb::new(188, 182, 255),
    Rgb::new(149, 181, 119),
    Rgb::new(191, 3, 184),
    Rgb::new(100, 84, 116),
    Rgb::new(121, 0, 0),
    Rgb::new(7, 116, 216),
    Rgb::new(114, 154, 124),
    Rgb::new(255, 119, 82),
    Rgb::new(0, 75, 0),
    Rgb::new(142, 123, 1),
    Rgb::new(242, 0, 123),
    Rgb::new(142, 186, 0),
    Rgb::new(165, 123, 184),
    Rgb::new(89, 1, 163),
    Rgb::new(226, 175, 175),
    Rgb::new(0, 222, 0),
    Rgb::new(255, 211, 0),
    Rgb::new(135, 255, 196),
    Rgb::new(102, 69, 0),
];

/// Source of per-category color mappings for taxonomy levels.
///
/// Implementations return [`Error::UnknownLevel`] for levels they do not
/// cover; the chart layer catches exactly that error and substitutes the
/// generic categorical palette.
pub trait PaletteProvider {
    fn taxonomy_palette(&self, level: TaxonomyLevel) -> Result<BTreeMap<String, Rgb>>;
}

/// A palette registry filled from an external taxonomy source.
#[derive(Debug, Default)]
pub struct PaletteBook {
    levels: BTreeMap<TaxonomyLevel, BTreeMap<String, Rgb>>,
}

impl PaletteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the palette for one level.
    pub fn with_level(mut self, level: TaxonomyLevel, palette: BTreeMap<String, Rgb>) -> Self {
        self.levels.insert(level, palette);
        self
    }
}

impl PaletteProvider for PaletteBook {
    fn taxonomy_palette(&self, level: TaxonomyLevel) -> Result<BTreeMap<String, Rgb>> {
        self.levels
            .get(&level)
            .cloned()
            .ok_or_else(|| Error::UnknownLevel(level.to_string()))
    }
}

/// Assign palette colors to categories by position, with `other` fixed to
/// [`OTHER_COLOR`].
pub fn fallback_palette(categories: &[String]) -> BTreeMap<String, Rgb> {
    categories
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let color = if name == OTHER_CATEGORY {
                OTHER_COLOR
            } else {
                CATEGORICAL_PALETTE[i % CATEGORICAL_PALETTE.len()]
            };
            (name.clone(), color)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_returns_registered_level() {
        let mut palette = BTreeMap::new();
        palette.insert("c1".to_string(), Rgb::new(1, 2, 3));
        let book = PaletteBook::new().with_level(TaxonomyLevel::Cluster, palette);

        let result = book.taxonomy_palette(TaxonomyLevel::Cluster).unwrap();
        assert_eq!(result["c1"], Rgb::new(1, 2, 3));
    }

    #[test]
    fn unregistered_level_is_unknown() {
        let book = PaletteBook::new();
        let err = book.taxonomy_palette(TaxonomyLevel::Subclass).unwrap_err();
        assert!(matches!(err, Error::UnknownLevel(_)));
    }

    #[test]
    fn fallback_covers_all_categories() {
        let categories: Vec<String> = (0..40).map(|i| format!("c{i}")).collect();
        let palette = fallback_palette(&categories);
        assert_eq!(palette.len(), 40);
    }

    #[test]
    fn fallback_pins_other_to_grey() {
        let categories = vec!["c1".to_string(), OTHER_CATEGORY.to_string()];
        let palette = fallback_palette(&categories);
        assert_eq!(palette[OTHER_CATEGORY], OTHER_COLOR);
    }
}
