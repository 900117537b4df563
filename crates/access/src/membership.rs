//! Subject membership index: which subjects can carry assignments for a person.

use std::collections::{BTreeMap, BTreeSet};

use accessgov_core::SubjectId;

use crate::assignment::{AssignmentCollection, EntitlementAssignment};
use crate::identity::IdentityContext;
use crate::subject::{SubjectTag, SubjectType};

/// Allowed subject ids per subject type for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedSubjects {
    by_type: BTreeMap<SubjectType, BTreeSet<SubjectId>>,
}

impl AllowedSubjects {
    pub fn build(identity: &IdentityContext) -> Self {
        let by_type = SubjectType::ALL
            .into_iter()
            .map(|kind| {
                let ids = match kind {
                    SubjectType::Person => BTreeSet::from([SubjectId::from(&identity.person_id)]),
                    SubjectType::Position => identity.positions.clone(),
                    SubjectType::JobTitle => identity.job_titles.clone(),
                    SubjectType::Capability => identity.capabilities.clone(),
                };
                (kind, ids)
            })
            .collect();

        Self { by_type }
    }

    pub fn contains(&self, kind: SubjectType, id: &SubjectId) -> bool {
        self.by_type.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// Membership check against a raw record tag; unrecognized tags hold nothing.
    pub fn contains_tag(&self, tag: &SubjectTag, id: &SubjectId) -> bool {
        tag.known().is_some_and(|kind| self.contains(kind, id))
    }

    pub fn holds(&self, assignment: &EntitlementAssignment) -> bool {
        self.contains_tag(&assignment.subject_type, &assignment.subject_id)
    }

    /// The assignments bound to a subject this identity holds, streams kept apart.
    pub fn select(&self, assignments: &AssignmentCollection) -> AssignmentCollection {
        let held = |stream: &[EntitlementAssignment]| -> Vec<EntitlementAssignment> {
            stream.iter().filter(|a| self.holds(a)).cloned().collect()
        };
        AssignmentCollection::new(held(&assignments.inherited), held(&assignments.direct))
    }
}
