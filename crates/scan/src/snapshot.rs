//! Point-in-time export of catalog, assignments, identities and directory state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use accessgov_access::{AssignmentCollection, Entitlement, EntitlementCatalog, IdentityContext};
use accessgov_core::{GroupId, PersonId};
use accessgov_drift::DirectoryObservation;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessSnapshot {
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
    #[serde(default)]
    pub assignments: AssignmentCollection,
    #[serde(default)]
    pub identities: Vec<IdentityContext>,
    #[serde(default)]
    pub observations: Vec<DirectoryObservation>,
}

impl AccessSnapshot {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse access snapshot")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }

    pub fn catalog(&self) -> EntitlementCatalog {
        self.entitlements.iter().cloned().collect()
    }

    /// Observed groups per person. Several observations for one person are merged.
    pub fn observed_groups(&self) -> BTreeMap<&PersonId, BTreeSet<GroupId>> {
        let mut by_person: BTreeMap<&PersonId, BTreeSet<GroupId>> = BTreeMap::new();
        for observation in &self.observations {
            by_person
                .entry(&observation.person_id)
                .or_default()
                .extend(observation.groups.iter().cloned());
        }
        by_person
    }
}
