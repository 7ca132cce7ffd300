//! Bump levels, service tiers, and the label classification table.
//!
//! [`BumpLevel`] is the single currency every signal is reduced to; fleet
//! combination is always "maximum under the total order". [`Tier`] caps how
//! large a bump a single service may contribute.

use serde::{Deserialize, Serialize};

/// Semantic version bump level, totally ordered: `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    None,
    Patch,
    Minor,
    Major,
}

impl BumpLevel {
    /// Lowercase label used in state files and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpLevel::None => "none",
            BumpLevel::Patch => "patch",
            BumpLevel::Minor => "minor",
            BumpLevel::Major => "major",
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service importance tier, fixed in configuration.
///
/// Serialized as the integer the configuration file uses (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Tier 1: no cap on contributed bumps.
    Critical,
    /// Tier 2: `Major` contributions are capped to `Minor`.
    Important,
    /// Tier 3: any non-`None` contribution collapses to `Patch`.
    Supporting,
}

impl Tier {
    /// Numeric form used in configuration and justification text.
    pub fn number(&self) -> u8 {
        match self {
            Tier::Critical => 1,
            Tier::Important => 2,
            Tier::Supporting => 3,
        }
    }

    /// Cap a raw bump level according to this tier.
    ///
    /// Guarantees a single non-critical service cannot alone force a
    /// fleet-wide `Major` bump.
    pub fn cap(&self, raw: BumpLevel) -> BumpLevel {
        match (self, raw) {
            (Tier::Critical, level) => level,
            (Tier::Important, BumpLevel::Major) => BumpLevel::Minor,
            (Tier::Important, level) => level,
            (Tier::Supporting, BumpLevel::None) => BumpLevel::None,
            (Tier::Supporting, _) => BumpLevel::Patch,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Critical),
            2 => Ok(Tier::Important),
            3 => Ok(Tier::Supporting),
            other => Err(format!("tier must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.number()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Classify a single pull-request label for a service of the given tier.
///
/// The table is deliberately narrow: only tier 1 may raise `Major` from a
/// label, tiers 1 and 2 share the feature/bugfix rows, and for tier 3 any
/// non-empty label counts as `Patch`. Everything else is `None`.
pub fn classify_label(tier: Tier, label: &str) -> BumpLevel {
    match tier {
        Tier::Critical => match label {
            "breaking-change" => BumpLevel::Major,
            "feature" | "enhancement" => BumpLevel::Minor,
            "bugfix" => BumpLevel::Patch,
            _ => BumpLevel::None,
        },
        Tier::Important => match label {
            "feature" | "enhancement" => BumpLevel::Minor,
            "bugfix" => BumpLevel::Patch,
            _ => BumpLevel::None,
        },
        Tier::Supporting => {
            if label.is_empty() {
                BumpLevel::None
            } else {
                BumpLevel::Patch
            }
        }
    }
}

/// The label-derived bump for a service plus the label that drove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVerdict {
    pub level: BumpLevel,
    /// The winning label, absent when `level` is `None`.
    pub label: Option<String>,
}

/// Reduce a set of labels to a single bump level.
///
/// Labels must be supplied in lexicographic order (the collector guarantees
/// this); only a strictly higher level replaces the running winner, so the
/// lexicographically-first label at the winning level is the one attributed.
pub fn classify_labels<'a, I>(tier: Tier, labels: I) -> LabelVerdict
where
    I: IntoIterator<Item = &'a str>,
{
    let mut verdict = LabelVerdict {
        level: BumpLevel::None,
        label: None,
    };
    for label in labels {
        let level = classify_label(tier, label);
        if level > verdict.level {
            verdict.level = level;
            verdict.label = Some(label.to_string());
        }
    }
    verdict
}
