use serde::{Deserialize, Serialize};

use accessgov_core::{AssignmentId, EntitlementId, ResourceId, SubjectId};

use crate::assignment::{AssignmentOrigin, Scope};
use crate::subject::SubjectType;

/// A currently-effective entitlement held by a person, with provenance.
///
/// One grant is produced per authorizing assignment, so the same entitlement
/// can show up several times with different sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveAccessGrant {
    pub entitlement_id: EntitlementId,
    pub resource_id: ResourceId,
    pub source_type: SubjectType,
    pub source_id: SubjectId,
    pub source_label: String,
    #[serde(flatten)]
    pub scope: Scope,
    pub assignment_id: AssignmentId,
    pub origin: AssignmentOrigin,
}
