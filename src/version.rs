//! Version model for entries listed by sources.
//!
//! Versions follow the common four-part `major.minor.micro.qualifier`
//! shape. Ordering is numeric on the triple, then lexicographic on the
//! qualifier, with an absent qualifier sorting lowest.

use crate::error::ShelfError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Qualifier a source attaches to placeholder versions of entries listed
/// under a group:artifact pseudo-identifier that are not real bundles.
pub const NOT_A_BUNDLE_QUALIFIER: &str = "NOT_A_BUNDLE";

/// An entry version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: Option<String>,
}

impl Version {
    /// The empty version, `0.0.0`. Used where a version is required but a
    /// resource declared none.
    pub const EMPTY: Version = Version {
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: None,
    };

    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: None,
        }
    }

    pub fn with_qualifier(major: u32, minor: u32, micro: u32, qualifier: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: Some(qualifier.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// True for placeholder versions of non-bundle artifacts.
    pub fn is_not_a_bundle(&self) -> bool {
        self.qualifier.as_deref() == Some(NOT_A_BUNDLE_QUALIFIER)
    }

    /// Parse a version string. Missing segments default to zero; an empty
    /// string parses to [`Version::EMPTY`]. Everything past the third dot
    /// is the qualifier.
    pub fn parse(s: &str) -> Result<Self, ShelfError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::EMPTY);
        }

        let mut numeric = [0u32; 3];
        let mut rest = s;
        for slot in numeric.iter_mut() {
            let (segment, remainder) = match rest.split_once('.') {
                Some((seg, rem)) => (seg, rem),
                None => (rest, ""),
            };
            *slot = segment
                .parse::<u32>()
                .map_err(|_| ShelfError::Version(s.to_string()))?;
            rest = remainder;
            if rest.is_empty() {
                break;
            }
        }

        let qualifier = if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        };
        Ok(Self {
            major: numeric[0],
            minor: numeric[1],
            micro: numeric[2],
            qualifier,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, ".{}", qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let v = Version::parse("1.2.3.beta").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.micro, 3);
        assert_eq!(v.qualifier.as_deref(), Some("beta"));
    }

    #[test]
    fn test_parse_partial_segments() {
        assert_eq!(Version::parse("2").unwrap(), Version::new(2, 0, 0));
        assert_eq!(Version::parse("2.1").unwrap(), Version::new(2, 1, 0));
        assert_eq!(Version::parse("").unwrap(), Version::EMPTY);
    }

    #[test]
    fn test_parse_qualifier_keeps_inner_dots() {
        let v = Version::parse("1.0.0.2024.06.01").unwrap();
        assert_eq!(v.qualifier.as_deref(), Some("2024.06.01"));
    }

    #[test]
    fn test_parse_rejects_non_numeric_segments() {
        assert!(Version::parse("one.two").is_err());
        assert!(Version::parse("1.x.3").is_err());
    }

    #[test]
    fn test_ordering() {
        let mut versions = vec![
            Version::parse("2.0.0").unwrap(),
            Version::parse("1.10.0").unwrap(),
            Version::parse("1.2.0").unwrap(),
            Version::parse("1.2.0.alpha").unwrap(),
        ];
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["1.2.0", "1.2.0.alpha", "1.10.0", "2.0.0"]);
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in ["0.0.0", "1.2.3", "1.2.3.qual"] {
            assert_eq!(Version::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_not_a_bundle_flag() {
        let flagged = Version::with_qualifier(1, 0, 0, NOT_A_BUNDLE_QUALIFIER);
        assert!(flagged.is_not_a_bundle());
        assert!(!Version::new(1, 0, 0).is_not_a_bundle());
    }
}
