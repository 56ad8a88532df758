//! Taxonomy level hierarchy

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A level of the cell-type taxonomy, finest to coarsest.
///
/// Cells carry one categorical label per level; the levels form a
/// hierarchy where every cluster belongs to a supertype and every
/// supertype to a subclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxonomyLevel {
    Cluster,
    Supertype,
    Subclass,
}

impl TaxonomyLevel {
    /// All levels, in the order metrics are reported.
    pub const ALL: &'static [TaxonomyLevel] =
        &[Self::Cluster, Self::Supertype, Self::Subclass];

    /// Column-name form of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Supertype => "supertype",
            Self::Subclass => "subclass",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster" => Ok(Self::Cluster),
            "supertype" => Ok(Self::Supertype),
            "subclass" => Ok(Self::Subclass),
            other => Err(Error::UnknownLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_names() {
        for &level in TaxonomyLevel::ALL {
            assert_eq!(level.as_str().parse::<TaxonomyLevel>().unwrap(), level);
        }
    }

    #[test]
    fn unknown_level_is_recognizable() {
        let err = "neighborhood".parse::<TaxonomyLevel>().unwrap_err();
        assert!(matches!(err, Error::UnknownLevel(_)));
    }
}
