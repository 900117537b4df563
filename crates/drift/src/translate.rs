//! Directory mapping: entitlements to external group identifiers and back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use accessgov_access::{EffectiveAccessGrant, EntitlementCatalog};
use accessgov_core::{EntitlementId, GroupId};

use crate::detect::DriftReport;

/// Groups the directory should show for `grants`.
///
/// Entitlements without a mapping have no directory representation and
/// contribute nothing. Several grants of one entitlement yield one group.
pub fn to_target_groups(grants: &[EffectiveAccessGrant], catalog: &EntitlementCatalog) -> BTreeSet<GroupId> {
    grants
        .iter()
        .filter_map(|grant| catalog.external_group(grant.entitlement_id.as_str()))
        .cloned()
        .collect()
}

/// Every group identifier that some entitlement maps to.
pub fn managed_groups(catalog: &EntitlementCatalog) -> BTreeSet<GroupId> {
    catalog.managed_groups()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Authorized but not present in the directory.
    Missing,
    /// Present in the directory, managed, but not authorized.
    Extra,
}

/// A drift finding attributed to the entitlements that map onto its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftFinding {
    pub group: GroupId,
    pub kind: FindingKind,
    pub entitlements: Vec<EntitlementId>,
}

/// Attribute every missing and extra group of `report` to catalog entitlements.
///
/// Missing findings come first, each list in group order.
pub fn attribute_findings(report: &DriftReport, catalog: &EntitlementCatalog) -> Vec<DriftFinding> {
    let missing = report.missing.iter().map(|g| (FindingKind::Missing, g));
    let extra = report.extra.iter().map(|g| (FindingKind::Extra, g));

    missing
        .chain(extra)
        .map(|(kind, group)| DriftFinding {
            group: group.clone(),
            kind,
            entitlements: catalog.entitlements_for_group(group),
        })
        .collect()
}
