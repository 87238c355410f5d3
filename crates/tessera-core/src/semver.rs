// crates/tessera-core/src/semver.rs
//
// Semantic version triple used for dataset versions.
//
// Serialized as the plain "major.minor.patch" string. Ordering is the
// tuple-lexicographic order of (major, minor, patch), which is what the
// derived `Ord` gives thanks to the field order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TesseraError;

/// Kind of version increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpKind::Major => write!(f, "major"),
            BumpKind::Minor => write!(f, "minor"),
            BumpKind::Patch => write!(f, "patch"),
        }
    }
}

/// A `major.minor.patch` version with non-negative components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version every new dataset starts at.
    pub const fn initial() -> Self {
        Self::new(1, 0, 0)
    }

    /// Apply a bump and return the next version. Fails when the bumped
    /// component is already `u64::MAX`.
    pub fn bump(&self, kind: BumpKind) -> Result<Self, TesseraError> {
        let next = match kind {
            BumpKind::Major => self.major.checked_add(1).map(|m| Self::new(m, 0, 0)),
            BumpKind::Minor => self
                .minor
                .checked_add(1)
                .map(|m| Self::new(self.major, m, 0)),
            BumpKind::Patch => self
                .patch
                .checked_add(1)
                .map(|p| Self::new(self.major, self.minor, p)),
        };
        next.ok_or_else(|| {
            TesseraError::Validation(format!("cannot apply a {} bump to {}", kind, self))
        })
    }
}

impl Default for SemVer {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = TesseraError;

    /// Parse a strict `major.minor.patch` string. Missing components,
    /// extra components, signs, and pre-release suffixes are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TesseraError::Validation(format!("invalid version string '{}'", s));

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut nums = [0u64; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl TryFrom<String> for SemVer {
    type Error = TesseraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SemVer> for String {
    fn from(v: SemVer) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let v: SemVer = "2.10.3".parse().unwrap();
        assert_eq!(v, SemVer::new(2, 10, 3));
        assert_eq!(v.to_string(), "2.10.3");
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "1", "1.2", "1.2.3.4", "1.-2.3", "v1.2.3", "1.2.3-beta", "1..3"] {
            assert!(bad.parse::<SemVer>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn bump_resets_lower_components() {
        let v = SemVer::new(1, 4, 7);
        assert_eq!(v.bump(BumpKind::Major).unwrap(), SemVer::new(2, 0, 0));
        assert_eq!(v.bump(BumpKind::Minor).unwrap(), SemVer::new(1, 5, 0));
        assert_eq!(v.bump(BumpKind::Patch).unwrap(), SemVer::new(1, 4, 8));
    }

    #[test]
    fn bump_at_the_ceiling_is_rejected() {
        let top: SemVer = format!("{}.{}.{}", u64::MAX, u64::MAX, u64::MAX)
            .parse()
            .unwrap();
        for kind in [BumpKind::Major, BumpKind::Minor, BumpKind::Patch] {
            assert!(matches!(top.bump(kind), Err(TesseraError::Validation(_))));
        }
        assert_eq!(
            SemVer::new(u64::MAX, 3, 0).bump(BumpKind::Patch).unwrap(),
            SemVer::new(u64::MAX, 3, 1)
        );
    }

    #[test]
    fn ordering_is_tuple_lexicographic() {
        assert!(SemVer::new(1, 10, 0) > SemVer::new(1, 9, 99));
        assert!(SemVer::new(2, 0, 0) > SemVer::new(1, 99, 99));
        assert!(SemVer::new(1, 0, 1) > SemVer::new(1, 0, 0));
    }

    #[test]
    fn serde_uses_plain_string() {
        let json = serde_json::to_string(&SemVer::new(3, 0, 1)).unwrap();
        assert_eq!(json, "\"3.0.1\"");
        let back: SemVer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SemVer::new(3, 0, 1));
        assert!(serde_json::from_str::<SemVer>("\"3.0\"").is_err());
    }
}
