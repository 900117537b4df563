//! Drift detection between authorized and observed directory groups.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use accessgov_core::{GroupId, PersonId};

/// Groups an identity currently holds in the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObservation {
    pub person_id: PersonId,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl DirectoryObservation {
    pub fn new(person_id: impl Into<PersonId>, groups: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            person_id: person_id.into(),
            groups: groups.into_iter().collect(),
        }
    }
}

/// Penalties applied per finding when scoring a report.
///
/// Over-privilege (extra) weighs twice as much as under-privilege (missing)
/// by default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrityWeights {
    pub missing_penalty: u32,
    pub extra_penalty: u32,
}

impl Default for IntegrityWeights {
    fn default() -> Self {
        Self {
            missing_penalty: 10,
            extra_penalty: 20,
        }
    }
}

impl IntegrityWeights {
    pub fn with_missing_penalty(mut self, penalty: u32) -> Self {
        self.missing_penalty = penalty;
        self
    }

    pub fn with_extra_penalty(mut self, penalty: u32) -> Self {
        self.extra_penalty = penalty;
        self
    }

    /// `100 - penalties`, clamped to `[0, 100]`.
    pub fn score(&self, missing: usize, extra: usize) -> u8 {
        let penalty = (missing as u64)
            .saturating_mul(u64::from(self.missing_penalty))
            .saturating_add((extra as u64).saturating_mul(u64::from(self.extra_penalty)));
        if penalty >= 100 { 0 } else { (100 - penalty) as u8 }
    }
}

/// Result of reconciling authorized groups against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    /// Authorized groups the directory does not show.
    pub missing: BTreeSet<GroupId>,
    /// Managed groups the directory shows without authorization.
    pub extra: BTreeSet<GroupId>,
    /// 0..=100, 100 meaning no drift.
    pub integrity_score: u8,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Diff with the default weights.
pub fn diff(
    target: &BTreeSet<GroupId>,
    observed: &BTreeSet<GroupId>,
    managed: &BTreeSet<GroupId>,
) -> DriftReport {
    diff_with(target, observed, managed, &IntegrityWeights::default())
}

/// Diff target groups against observed groups.
///
/// Observed groups outside `managed` are foreign to this system and never
/// reported.
pub fn diff_with(
    target: &BTreeSet<GroupId>,
    observed: &BTreeSet<GroupId>,
    managed: &BTreeSet<GroupId>,
    weights: &IntegrityWeights,
) -> DriftReport {
    let missing: BTreeSet<GroupId> = target.difference(observed).cloned().collect();
    let extra: BTreeSet<GroupId> = observed
        .intersection(managed)
        .filter(|g| !target.contains(*g))
        .cloned()
        .collect();
    let integrity_score = weights.score(missing.len(), extra.len());

    DriftReport {
        missing,
        extra,
        integrity_score,
    }
}
