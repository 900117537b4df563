use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use accessgov_core::{PersonId, SubjectId};

/// One person and the subjects they currently hold.
///
/// Supplied fresh for each resolution; nothing here is cached across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityContext {
    pub person_id: PersonId,
    #[serde(default)]
    pub positions: BTreeSet<SubjectId>,
    #[serde(default, alias = "jobProfiles")]
    pub job_titles: BTreeSet<SubjectId>,
    #[serde(default)]
    pub capabilities: BTreeSet<SubjectId>,
}

impl IdentityContext {
    pub fn new(person_id: impl Into<PersonId>) -> Self {
        Self {
            person_id: person_id.into(),
            positions: BTreeSet::new(),
            job_titles: BTreeSet::new(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_position(mut self, id: impl Into<SubjectId>) -> Self {
        self.positions.insert(id.into());
        self
    }

    pub fn with_job_title(mut self, id: impl Into<SubjectId>) -> Self {
        self.job_titles.insert(id.into());
        self
    }

    pub fn with_capability(mut self, id: impl Into<SubjectId>) -> Self {
        self.capabilities.insert(id.into());
        self
    }
}
