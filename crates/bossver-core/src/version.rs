//! Release-tag parsing, version deltas, and bump arithmetic.
//!
//! Tags arrive as free-form strings (`v2.1.0`, `2.1.0-rc.1`, ...); parsing
//! fails softly to `None` so callers degrade to "no delta" instead of
//! aborting a fleet run over one malformed tag.

use serde::{Deserialize, Serialize};

use crate::bump::BumpLevel;

/// A parsed `(major, minor, patch)` release tag.
///
/// Ordering is lexicographic over the triple, which matches semantic
/// version precedence for the core components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTag {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTag {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a release-tag string into a version triple.
    ///
    /// Strips any leading non-digit marker characters (`v1.2.3`,
    /// `release-1.2.3`), reads a leading `MAJOR.MINOR.PATCH` integer triple,
    /// and ignores a trailing pre-release or build suffix (`1.2.3-rc.1`,
    /// `1.2.3+build.7`). Returns `None` when the triple is absent.
    pub fn parse(tag: &str) -> Option<Self> {
        let start = tag.find(|c: char| c.is_ascii_digit())?;
        let mut rest = &tag[start..];

        let major = take_number(&mut rest)?;
        rest = rest.strip_prefix('.')?;
        let minor = take_number(&mut rest)?;
        rest = rest.strip_prefix('.')?;
        let patch = take_number(&mut rest)?;

        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

/// Consume the leading decimal run of `rest`, advancing it past the digits.
fn take_number(rest: &mut &str) -> Option<u64> {
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let value = rest[..end].parse().ok()?;
    *rest = &rest[end..];
    Some(value)
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Classify the bump between two release tags.
///
/// Components are compared in priority order major, minor, patch; the first
/// component where `new > old` decides the level. Absent or unparsable tags
/// (including manifest sentinels like `"no-release"`) classify as `None`.
/// Pre-release metadata is never inspected.
pub fn classify_delta(old_tag: Option<&str>, new_tag: Option<&str>) -> BumpLevel {
    let (old, new) = match (
        old_tag.and_then(VersionTag::parse),
        new_tag.and_then(VersionTag::parse),
    ) {
        (Some(o), Some(n)) => (o, n),
        _ => return BumpLevel::None,
    };

    if new.major > old.major {
        BumpLevel::Major
    } else if new.minor > old.minor {
        BumpLevel::Minor
    } else if new.patch > old.patch {
        BumpLevel::Patch
    } else {
        BumpLevel::None
    }
}

/// The fleet-wide ("BOSS") version.
///
/// Serialized as the `"M.m.p"` string the state file stores. The inner
/// triple is private so every instance went through parsing or arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FleetVersion(VersionTag);

impl FleetVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(VersionTag::new(major, minor, patch))
    }

    /// Apply a bump level, producing the next fleet version.
    ///
    /// Lower components always reset to zero on a higher-order bump; `None`
    /// returns the version unchanged.
    pub fn bump(&self, level: BumpLevel) -> Self {
        let v = self.0;
        match level {
            BumpLevel::Major => Self::new(v.major + 1, 0, 0),
            BumpLevel::Minor => Self::new(v.major, v.minor + 1, 0),
            BumpLevel::Patch => Self::new(v.major, v.minor, v.patch + 1),
            BumpLevel::None => *self,
        }
    }
}

impl TryFrom<String> for FleetVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        VersionTag::parse(&s)
            .map(FleetVersion)
            .ok_or_else(|| format!("not a M.m.p version string: '{s}'"))
    }
}

impl From<FleetVersion> for String {
    fn from(v: FleetVersion) -> String {
        v.to_string()
    }
}

impl std::fmt::Display for FleetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_prefixed_tags() {
        assert_eq!(VersionTag::parse("1.2.3"), Some(VersionTag::new(1, 2, 3)));
        assert_eq!(VersionTag::parse("v1.2.3"), Some(VersionTag::new(1, 2, 3)));
        assert_eq!(
            VersionTag::parse("release-10.0.2"),
            Some(VersionTag::new(10, 0, 2))
        );
    }

    #[test]
    fn test_parse_ignores_prerelease_and_build_suffix() {
        assert_eq!(
            VersionTag::parse("v2.0.0-rc.1"),
            Some(VersionTag::new(2, 0, 0))
        );
        assert_eq!(
            VersionTag::parse("1.4.2+build.99"),
            Some(VersionTag::new(1, 4, 2))
        );
    }

    #[test]
    fn test_parse_rejects_non_versions() {
        assert_eq!(VersionTag::parse(""), None);
        assert_eq!(VersionTag::parse("latest"), None);
        assert_eq!(VersionTag::parse("v1.2"), None);
        assert_eq!(VersionTag::parse("no-release"), None);
        assert_eq!(VersionTag::parse("fetch-error"), None);
    }

    #[test]
    fn test_delta_prefers_highest_order_component() {
        assert_eq!(
            classify_delta(Some("1.2.3"), Some("2.0.0")),
            BumpLevel::Major
        );
        assert_eq!(
            classify_delta(Some("1.2.3"), Some("1.3.0")),
            BumpLevel::Minor
        );
        assert_eq!(
            classify_delta(Some("1.2.3"), Some("1.2.4")),
            BumpLevel::Patch
        );
        assert_eq!(
            classify_delta(Some("1.2.3"), Some("1.2.3")),
            BumpLevel::None
        );
    }

    #[test]
    fn test_delta_with_missing_or_bad_tags_is_none() {
        assert_eq!(classify_delta(None, Some("1.0.0")), BumpLevel::None);
        assert_eq!(classify_delta(Some("1.0.0"), None), BumpLevel::None);
        assert_eq!(
            classify_delta(Some("no-release"), Some("1.0.0")),
            BumpLevel::None
        );
    }

    #[test]
    fn test_delta_never_inspects_prerelease() {
        assert_eq!(
            classify_delta(Some("1.0.0-alpha"), Some("1.0.0-beta")),
            BumpLevel::None
        );
    }

    #[test]
    fn test_bump_arithmetic_resets_lower_components() {
        let v = FleetVersion::new(1, 4, 2);
        let major = v.bump(BumpLevel::Major);
        assert_eq!(major, FleetVersion::new(2, 0, 0));
        let minor = major.bump(BumpLevel::Minor);
        assert_eq!(minor, FleetVersion::new(2, 1, 0));
        let patch = minor.bump(BumpLevel::Patch);
        assert_eq!(patch, FleetVersion::new(2, 1, 1));
        assert_eq!(patch.bump(BumpLevel::None), patch);
    }

    #[test]
    fn test_fleet_version_serde_is_string_shaped() {
        let v = FleetVersion::new(3, 0, 12);
        let json = serde_json::to_string(&v).expect("serialize");
        assert_eq!(json, "\"3.0.12\"");
        let back: FleetVersion = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, v);
        assert!(serde_json::from_str::<FleetVersion>("\"not-a-version\"").is_err());
    }
}
