//! Diversity indices over categorical samples
//!
//! Each statistic takes a finite multiset of category codes (order
//! irrelevant) and returns a scalar. Empty samples are an error: every
//! denominator here is the sample size, and callers (the region and local
//! engines) only ever form non-empty groups.

use std::collections::HashMap;

use cellscape_core::{Error, Result};

/// Occurrence threshold for `count_gt_threshold`: a category counts only
/// when it has strictly more than this many cells.
pub const GT_CELL_THRESHOLD: usize = 5;

/// A diversity statistic over one categorical sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiversityStat {
    /// Number of distinct categories present.
    CountUnique,
    /// Distinct categories divided by sample size.
    CountUniqueNorm,
    /// Categories with more than [`GT_CELL_THRESHOLD`] occurrences.
    CountGtThreshold,
    /// Inverse Simpson's index, `1 / sum(p_i^2)`. Range [1, inf).
    InverseSimpson,
    /// Shannon index, `-sum(p_i * log2(p_i))`. Range [0, log2(k)].
    Shannon,
}

impl DiversityStat {
    /// Evaluate the statistic over a sample of category codes.
    pub fn evaluate(&self, sample: &[u32]) -> Result<f64> {
        match self {
            Self::CountUnique => count_unique(sample),
            Self::CountUniqueNorm => count_unique_norm(sample),
            Self::CountGtThreshold => count_gt_threshold(sample),
            Self::InverseSimpson => inverse_simpson_index(sample),
            Self::Shannon => shannon_index(sample),
        }
    }
}

fn tally(sample: &[u32]) -> Result<HashMap<u32, usize>> {
    if sample.is_empty() {
        return Err(Error::EmptySample);
    }
    let mut counts = HashMap::new();
    for &code in sample {
        *counts.entry(code).or_insert(0usize) += 1;
    }
    Ok(counts)
}

/// Number of distinct categories in the sample.
pub fn count_unique(sample: &[u32]) -> Result<f64> {
    Ok(tally(sample)?.len() as f64)
}

/// Distinct-category count normalized by sample size.
///
/// Controls for differences in cell density and region size.
pub fn count_unique_norm(sample: &[u32]) -> Result<f64> {
    Ok(tally(sample)?.len() as f64 / sample.len() as f64)
}

/// Number of categories occurring strictly more than [`GT_CELL_THRESHOLD`]
/// times.
pub fn count_gt_threshold(sample: &[u32]) -> Result<f64> {
    Ok(tally(sample)?
        .values()
        .filter(|&&c| c > GT_CELL_THRESHOLD)
        .count() as f64)
}

/// Inverse Simpson's index.
///
/// `1 / sum(p_i^2)` where `p_i` is the proportion of category i. Ranges
/// from 1 (no diversity) upward; equals the number of categories when all
/// are equally abundant.
pub fn inverse_simpson_index(sample: &[u32]) -> Result<f64> {
    let counts = tally(sample)?;
    let total = sample.len() as f64;

    let d: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum();

    Ok(1.0 / d)
}

/// Shannon diversity index, base 2.
///
/// `-sum(p_i * log2(p_i))` over categories present in the sample. Zero for
/// a single-category sample; `log2(k)` when k categories appear with equal
/// frequency.
pub fn shannon_index(sample: &[u32]) -> Result<f64> {
    let counts = tally(sample)?;
    let total = sample.len() as f64;

    // Only present categories contribute; p > 0 so log2 is finite.
    let h: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p.log2()
        })
        .sum();

    // A single-category sample sums to exactly 0.0; negating that would
    // yield -0.0, which renders as "-0.000".
    Ok(if h == 0.0 { 0.0 } else { -h })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_is_an_error() {
        for stat in [
            DiversityStat::CountUnique,
            DiversityStat::CountUniqueNorm,
            DiversityStat::CountGtThreshold,
            DiversityStat::InverseSimpson,
            DiversityStat::Shannon,
        ] {
            assert!(matches!(stat.evaluate(&[]), Err(Error::EmptySample)));
        }
    }

    #[test]
    fn count_unique_basic() {
        assert_eq!(count_unique(&[1, 1, 2, 3]).unwrap(), 3.0);
        assert_eq!(count_unique(&[7]).unwrap(), 1.0);
    }

    #[test]
    fn count_unique_norm_identity() {
        let sample = [1, 1, 2, 3, 3, 3];
        let expected = count_unique(&sample).unwrap() / sample.len() as f64;
        assert_eq!(count_unique_norm(&sample).unwrap(), expected);
    }

    #[test]
    fn gt_threshold_is_strict() {
        // category 0: exactly 5 occurrences -> not counted
        let five = vec![0u32; 5];
        assert_eq!(count_gt_threshold(&five).unwrap(), 0.0);

        // category 0: exactly 6 occurrences -> counted
        let six = vec![0u32; 6];
        assert_eq!(count_gt_threshold(&six).unwrap(), 1.0);

        // mixed: one category over, one under
        let mut mixed = vec![0u32; 7];
        mixed.extend([1, 1, 1]);
        assert_eq!(count_gt_threshold(&mixed).unwrap(), 1.0);
    }

    #[test]
    fn inverse_simpson_single_category_is_one() {
        let sample = vec![4u32; 20];
        assert!((inverse_simpson_index(&sample).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_simpson_uniform_equals_category_count() {
        // 4 categories, 5 cells each: ISI = 1 / (4 * 0.25^2) = 4
        let mut sample = Vec::new();
        for code in 0..4u32 {
            sample.extend(std::iter::repeat(code).take(5));
        }
        assert!((inverse_simpson_index(&sample).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_simpson_at_least_one() {
        let sample = [0, 0, 0, 1, 2, 2, 3, 3, 3, 3];
        let isi = inverse_simpson_index(&sample).unwrap();
        assert!(isi >= 1.0);
    }

    #[test]
    fn shannon_single_category_is_positive_zero() {
        let sample = vec![9u32; 12];
        let h = shannon_index(&sample).unwrap();
        assert_eq!(h, 0.0);
        // Not -0.0: the value must format as "0", not "-0".
        assert!(h.is_sign_positive());
    }

    #[test]
    fn shannon_uniform_attains_log2_k() {
        // 8 categories equally abundant: H = log2(8) = 3
        let mut sample = Vec::new();
        for code in 0..8u32 {
            sample.extend(std::iter::repeat(code).take(3));
        }
        assert!((shannon_index(&sample).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn shannon_bounded_by_log2_k() {
        let sample = [0, 0, 0, 0, 1, 1, 2];
        let h = shannon_index(&sample).unwrap();
        assert!(h >= 0.0);
        assert!(h <= (3f64).log2());
    }

    #[test]
    fn shannon_known_value() {
        // p = [0.5, 0.25, 0.25] -> H = 1.5
        let sample = [0, 0, 1, 2];
        assert!((shannon_index(&sample).unwrap() - 1.5).abs() < 1e-12);
    }
}
