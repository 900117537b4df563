//! Entitlement catalog (read-only view of the catalog collaborator's data).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use accessgov_core::{EntitlementId, Entity, GroupId, ResourceId};

/// Risk classification of an entitlement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    /// Missing or not one of the known levels.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A grantable permission on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub id: EntitlementId,
    pub resource_id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Group identifier recognized by the external directory, if any.
    #[serde(default, alias = "adGroup", skip_serializing_if = "Option::is_none")]
    pub external_group: Option<GroupId>,
}

impl Entitlement {
    pub fn new(
        id: impl Into<EntitlementId>,
        resource_id: impl Into<ResourceId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            name: name.into(),
            risk_level: RiskLevel::Unknown,
            external_group: None,
        }
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_external_group(mut self, group: impl Into<GroupId>) -> Self {
        self.external_group = Some(group.into());
        self
    }
}

impl Entity for Entitlement {
    type Id = EntitlementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Catalog of entitlements keyed by id.
///
/// Later entries with a duplicate id replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementCatalog {
    entries: BTreeMap<EntitlementId, Entitlement>,
}

impl EntitlementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entitlement: Entitlement) {
        self.entries.insert(entitlement.id().clone(), entitlement);
    }

    pub fn get(&self, id: &str) -> Option<&Entitlement> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entitlement> {
        self.entries.values()
    }

    /// External group mapped from `id`, if the entitlement exists and has one.
    pub fn external_group(&self, id: &str) -> Option<&GroupId> {
        self.get(id).and_then(|e| e.external_group.as_ref())
    }

    /// All external groups that appear in any mapping.
    ///
    /// These are the groups this system has authority over.
    pub fn managed_groups(&self) -> BTreeSet<GroupId> {
        self.iter().filter_map(|e| e.external_group.clone()).collect()
    }

    /// Entitlements mapped onto `group`, in id order.
    pub fn entitlements_for_group(&self, group: &GroupId) -> Vec<EntitlementId> {
        self.iter()
            .filter(|e| e.external_group.as_ref() == Some(group))
            .map(|e| e.id.clone())
            .collect()
    }
}

impl FromIterator<Entitlement> for EntitlementCatalog {
    fn from_iter<I: IntoIterator<Item = Entitlement>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for entitlement in iter {
            catalog.insert(entitlement);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EntitlementCatalog {
        [
            Entitlement::new("e1", "r1", "Admin").with_external_group("grp-admins"),
            Entitlement::new("e2", "r1", "Read"),
            Entitlement::new("e3", "r2", "Admin (legacy)").with_external_group("grp-admins"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn managed_groups_are_deduplicated() {
        let groups = catalog().managed_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups.contains("grp-admins"));
    }

    #[test]
    fn reverse_lookup_lists_every_mapped_entitlement() {
        let ids = catalog().entitlements_for_group(&GroupId::new("grp-admins"));
        assert_eq!(ids, vec![EntitlementId::new("e1"), EntitlementId::new("e3")]);
    }

    #[test]
    fn deserializes_stored_record_shape() {
        let json = r#"{
            "id": "e7",
            "resourceId": "sap",
            "name": "Posting",
            "riskLevel": "critical",
            "adGroup": "CN=SAP-Post"
        }"#;
        let e: Entitlement = serde_json::from_str(json).unwrap();
        assert_eq!(e.risk_level, RiskLevel::Critical);
        assert_eq!(e.external_group, Some(GroupId::new("CN=SAP-Post")));
    }

    #[test]
    fn unknown_risk_level_does_not_fail() {
        let json = r#"{ "id": "e8", "resourceId": "crm", "riskLevel": "severe" }"#;
        let e: Entitlement = serde_json::from_str(json).unwrap();
        assert_eq!(e.risk_level, RiskLevel::Unknown);
        assert!(e.external_group.is_none());
    }
}
