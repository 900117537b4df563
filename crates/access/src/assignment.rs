//! Assignment records: bindings of entitlements to subjects.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use accessgov_core::{AssignmentId, EntitlementId, Entity, SubjectId};

use crate::subject::{SubjectTag, SubjectType};

/// Lifecycle status of an assignment.
///
/// Statuses are free-form in the assignment store; anything outside the
/// well-known set is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssignmentStatus {
    Active,
    Approved,
    Pending,
    Revoked,
    Other(String),
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Approved => "approved",
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Revoked => "revoked",
            AssignmentStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for AssignmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => AssignmentStatus::Active,
            "approved" => AssignmentStatus::Approved,
            "pending" => AssignmentStatus::Pending,
            "revoked" => AssignmentStatus::Revoked,
            _ => AssignmentStatus::Other(value),
        }
    }
}

impl From<AssignmentStatus> for String {
    fn from(value: AssignmentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for AssignmentStatus {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AssignmentStatus::from(s.to_string()))
    }
}

impl core::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional validity window of an assignment.
///
/// Bounds are kept as the raw text from the record: a bound that does not
/// parse is ignored at evaluation time rather than rejected on load. A bound
/// that is not a JSON string at all (epoch millis, a `{seconds, nanoseconds}`
/// timestamp) is kept as its JSON text and ignored the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    #[serde(default, deserialize_with = "raw_bound", skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, deserialize_with = "raw_bound", skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

fn raw_bound<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => Some(raw),
        Some(other) => Some(other.to_string()),
    })
}

impl ValidityWindow {
    pub fn between(from: impl Into<String>, until: impl Into<String>) -> Self {
        Self {
            valid_from: Some(from.into()),
            valid_until: Some(until.into()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.valid_from.is_none() && self.valid_until.is_none()
    }
}

/// Organisational scope an assignment is limited to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,
    #[serde(default)]
    pub include_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_context: Option<String>,
}

/// A binding of an entitlement to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementAssignment {
    pub id: AssignmentId,
    pub entitlement_id: EntitlementId,
    pub subject_type: SubjectTag,
    pub subject_id: SubjectId,
    pub status: AssignmentStatus,
    #[serde(flatten)]
    pub validity: ValidityWindow,
    #[serde(flatten)]
    pub scope: Scope,
}

impl EntitlementAssignment {
    /// New active assignment with an open window and no scope.
    pub fn new(
        id: impl Into<AssignmentId>,
        entitlement_id: impl Into<EntitlementId>,
        subject_type: SubjectType,
        subject_id: impl Into<SubjectId>,
    ) -> Self {
        Self {
            id: id.into(),
            entitlement_id: entitlement_id.into(),
            subject_type: SubjectTag::Known(subject_type),
            subject_id: subject_id.into(),
            status: AssignmentStatus::Active,
            validity: ValidityWindow::default(),
            scope: Scope::default(),
        }
    }

    pub fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

impl Entity for EntitlementAssignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Which stream an assignment arrived through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOrigin {
    /// Synchronized from a group or blueprint (position, job profile, ...).
    Inherited,
    /// Granted manually.
    Direct,
}

/// The two assignment streams relevant to one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCollection {
    #[serde(default)]
    pub inherited: Vec<EntitlementAssignment>,
    #[serde(default)]
    pub direct: Vec<EntitlementAssignment>,
}

impl AssignmentCollection {
    pub fn new(inherited: Vec<EntitlementAssignment>, direct: Vec<EntitlementAssignment>) -> Self {
        Self { inherited, direct }
    }

    /// Inherited assignments first, then direct ones.
    ///
    /// The order fixes output order only; neither stream takes precedence.
    pub fn iter(&self) -> impl Iterator<Item = (AssignmentOrigin, &EntitlementAssignment)> {
        self.inherited
            .iter()
            .map(|a| (AssignmentOrigin::Inherited, a))
            .chain(self.direct.iter().map(|a| (AssignmentOrigin::Direct, a)))
    }

    pub fn len(&self) -> usize {
        self.inherited.len() + self.direct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
