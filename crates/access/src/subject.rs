use core::str::FromStr;

use serde::{Deserialize, Serialize};

use accessgov_core::DomainError;

/// Kind of subject an assignment can be bound to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    /// Bound to the person directly.
    #[serde(rename = "person")]
    Person,
    /// Bound to a position in the org chart.
    #[serde(rename = "position")]
    Position,
    /// Bound to a job profile (a reusable blueprint of entitlements).
    #[serde(rename = "jobTitle")]
    JobTitle,
    /// Bound to an ad-hoc supplemental function (e.g. "fire warden").
    #[serde(rename = "capability")]
    Capability,
}

impl SubjectType {
    pub const ALL: [SubjectType; 4] = [
        SubjectType::Person,
        SubjectType::Position,
        SubjectType::JobTitle,
        SubjectType::Capability,
    ];

    /// Tag used in stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Person => "person",
            SubjectType::Position => "position",
            SubjectType::JobTitle => "jobTitle",
            SubjectType::Capability => "capability",
        }
    }

    /// Human-readable label shown as the source of a grant.
    pub fn label(&self) -> &'static str {
        match self {
            SubjectType::Person => "Person",
            SubjectType::Position => "Position",
            SubjectType::JobTitle => "Job Profile",
            SubjectType::Capability => "Capability",
        }
    }
}

impl core::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unrecognized subject type '{s}'")))
    }
}

/// Subject tag as found on an assignment record.
///
/// Stored records are loosely typed, so a tag outside the known set is kept
/// verbatim instead of failing deserialization. Such assignments never
/// produce grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubjectTag {
    Known(SubjectType),
    Unrecognized(String),
}

impl SubjectTag {
    pub fn known(&self) -> Option<SubjectType> {
        match self {
            SubjectTag::Known(t) => Some(*t),
            SubjectTag::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubjectTag::Known(t) => t.as_str(),
            SubjectTag::Unrecognized(raw) => raw,
        }
    }
}

impl From<SubjectType> for SubjectTag {
    fn from(value: SubjectType) -> Self {
        SubjectTag::Known(value)
    }
}

impl From<String> for SubjectTag {
    fn from(value: String) -> Self {
        match value.parse::<SubjectType>() {
            Ok(t) => SubjectTag::Known(t),
            Err(_) => SubjectTag::Unrecognized(value),
        }
    }
}

impl From<SubjectTag> for String {
    fn from(value: SubjectTag) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for SubjectTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
