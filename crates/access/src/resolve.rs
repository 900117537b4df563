//! Effective access resolution.
//!
//! - No IO
//! - No panics
//! - No clock reads (the reference instant is always passed in)
//!
//! Data-quality problems never abort a resolution: the offending assignment is
//! skipped and the reason is recorded in [`Resolution::skipped`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use accessgov_core::{AssignmentId, EntitlementId, SubjectId};

use crate::assignment::{AssignmentCollection, AssignmentOrigin, AssignmentStatus, EntitlementAssignment};
use crate::catalog::EntitlementCatalog;
use crate::grant::EffectiveAccessGrant;
use crate::identity::IdentityContext;
use crate::membership::AllowedSubjects;
use crate::subject::{SubjectTag, SubjectType};
use crate::validity::{AsOf, is_valid};

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    effective_statuses: BTreeSet<AssignmentStatus>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            effective_statuses: BTreeSet::from([AssignmentStatus::Active, AssignmentStatus::Approved]),
        }
    }
}

impl ResolverConfig {
    /// Replace the set of statuses that count as effective.
    pub fn with_effective_statuses(mut self, statuses: impl IntoIterator<Item = AssignmentStatus>) -> Self {
        self.effective_statuses = statuses.into_iter().collect();
        self
    }

    pub fn is_effective(&self, status: &AssignmentStatus) -> bool {
        self.effective_statuses.contains(status)
    }
}

/// Why an assignment produced no grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    IneffectiveStatus { status: AssignmentStatus },
    OutsideValidityWindow,
    UnrecognizedSubjectType { tag: String },
    SubjectNotHeld { subject_type: SubjectType, subject_id: SubjectId },
    UnknownEntitlement { entitlement_id: EntitlementId },
}

impl SkipReason {
    pub fn kind(&self) -> SkipKind {
        match self {
            SkipReason::IneffectiveStatus { .. } => SkipKind::IneffectiveStatus,
            SkipReason::OutsideValidityWindow => SkipKind::OutsideValidityWindow,
            SkipReason::UnrecognizedSubjectType { .. } => SkipKind::UnrecognizedSubjectType,
            SkipReason::SubjectNotHeld { .. } => SkipKind::SubjectNotHeld,
            SkipReason::UnknownEntitlement { .. } => SkipKind::UnknownEntitlement,
        }
    }

    /// Data-quality problems (as opposed to ordinary non-applicability).
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            SkipReason::UnrecognizedSubjectType { .. } | SkipReason::UnknownEntitlement { .. }
        )
    }
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SkipReason::IneffectiveStatus { status } => write!(f, "status '{status}' is not effective"),
            SkipReason::OutsideValidityWindow => f.write_str("outside validity window"),
            SkipReason::UnrecognizedSubjectType { tag } => write!(f, "unrecognized subject type '{tag}'"),
            SkipReason::SubjectNotHeld { subject_type, subject_id } => {
                write!(f, "{} '{subject_id}' is not held by the identity", subject_type.label())
            }
            SkipReason::UnknownEntitlement { entitlement_id } => {
                write!(f, "entitlement '{entitlement_id}' is not in the catalog")
            }
        }
    }
}

/// Skip reason without payload, for counting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    IneffectiveStatus,
    OutsideValidityWindow,
    UnrecognizedSubjectType,
    SubjectNotHeld,
    UnknownEntitlement,
}

/// Diagnostic entry for an assignment that produced no grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAssignment {
    pub assignment_id: AssignmentId,
    pub origin: AssignmentOrigin,
    pub reason: SkipReason,
}

/// Output of a resolution: grants in processing order plus skip diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub grants: Vec<EffectiveAccessGrant>,
    pub skipped: Vec<SkippedAssignment>,
}

impl Resolution {
    /// Number of skipped assignments per reason.
    pub fn skip_counts(&self) -> BTreeMap<SkipKind, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skipped {
            *counts.entry(skip.reason.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Grants for one entitlement, one per authorizing source.
    pub fn grants_for<'a>(&'a self, entitlement_id: &'a str) -> impl Iterator<Item = &'a EffectiveAccessGrant> {
        self.grants
            .iter()
            .filter(move |g| g.entitlement_id.as_str() == entitlement_id)
    }

    /// Distinct entitlements held, regardless of how many sources grant them.
    pub fn entitlement_ids(&self) -> BTreeSet<&EntitlementId> {
        self.grants.iter().map(|g| &g.entitlement_id).collect()
    }
}

/// Resolve the effective grants of `identity` with the default configuration.
pub fn resolve(
    identity: &IdentityContext,
    assignments: &AssignmentCollection,
    catalog: &EntitlementCatalog,
    as_of: &AsOf,
) -> Resolution {
    resolve_with(identity, assignments, catalog, as_of, &ResolverConfig::default())
}

/// Resolve the effective grants of `identity`.
///
/// Inherited assignments are processed before direct ones; every assignment
/// that passes all checks yields its own grant. No deduplication is done, so
/// each source stays visible in audit trails.
pub fn resolve_with(
    identity: &IdentityContext,
    assignments: &AssignmentCollection,
    catalog: &EntitlementCatalog,
    as_of: &AsOf,
    config: &ResolverConfig,
) -> Resolution {
    let allowed = AllowedSubjects::build(identity);
    let mut resolution = Resolution::default();

    for (origin, assignment) in assignments.iter() {
        match evaluate(&allowed, assignment, origin, catalog, as_of, config) {
            Ok(grant) => resolution.grants.push(grant),
            Err(reason) => {
                if reason.is_anomaly() {
                    tracing::warn!(
                        person_id = %identity.person_id,
                        assignment_id = %assignment.id,
                        entitlement_id = %assignment.entitlement_id,
                        reason = %reason,
                        "skipping malformed assignment"
                    );
                } else {
                    tracing::debug!(
                        person_id = %identity.person_id,
                        assignment_id = %assignment.id,
                        reason = %reason,
                        "assignment not effective"
                    );
                }
                resolution.skipped.push(SkippedAssignment {
                    assignment_id: assignment.id.clone(),
                    origin,
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        person_id = %identity.person_id,
        as_of = %as_of,
        grants = resolution.grants.len(),
        skipped = resolution.skipped.len(),
        "resolved effective access"
    );

    resolution
}

/// Assignment streams split into well-formed records and record-level anomalies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenedAssignments {
    pub assignments: AssignmentCollection,
    pub malformed: Vec<SkippedAssignment>,
}

/// Set aside records that can never grant, whoever the identity is: an
/// unrecognized subject type or an entitlement missing from the catalog.
///
/// Batch callers screen a snapshot once so each malformed record is reported
/// once rather than once per identity resolved against it.
pub fn screen_records(assignments: &AssignmentCollection, catalog: &EntitlementCatalog) -> ScreenedAssignments {
    let mut screened = ScreenedAssignments::default();

    for (origin, assignment) in assignments.iter() {
        match record_anomaly(assignment, catalog) {
            Some(reason) => screened.malformed.push(SkippedAssignment {
                assignment_id: assignment.id.clone(),
                origin,
                reason,
            }),
            None => match origin {
                AssignmentOrigin::Inherited => screened.assignments.inherited.push(assignment.clone()),
                AssignmentOrigin::Direct => screened.assignments.direct.push(assignment.clone()),
            },
        }
    }

    screened
}

fn record_anomaly(assignment: &EntitlementAssignment, catalog: &EntitlementCatalog) -> Option<SkipReason> {
    if let SubjectTag::Unrecognized(tag) = &assignment.subject_type {
        return Some(SkipReason::UnrecognizedSubjectType { tag: tag.clone() });
    }
    if !catalog.contains(assignment.entitlement_id.as_str()) {
        return Some(SkipReason::UnknownEntitlement {
            entitlement_id: assignment.entitlement_id.clone(),
        });
    }
    None
}

/// Explain the decision for a single assignment.
///
/// Applies exactly the checks `resolve_with` applies, in the same order, and
/// returns either the grant or the first reason it was rejected.
pub fn explain(
    identity: &IdentityContext,
    assignment: &EntitlementAssignment,
    origin: AssignmentOrigin,
    catalog: &EntitlementCatalog,
    as_of: &AsOf,
    config: &ResolverConfig,
) -> Result<EffectiveAccessGrant, SkipReason> {
    let allowed = AllowedSubjects::build(identity);
    evaluate(&allowed, assignment, origin, catalog, as_of, config)
}

fn evaluate(
    allowed: &AllowedSubjects,
    assignment: &EntitlementAssignment,
    origin: AssignmentOrigin,
    catalog: &EntitlementCatalog,
    as_of: &AsOf,
    config: &ResolverConfig,
) -> Result<EffectiveAccessGrant, SkipReason> {
    if !config.is_effective(&assignment.status) {
        return Err(SkipReason::IneffectiveStatus {
            status: assignment.status.clone(),
        });
    }

    if !is_valid(assignment, as_of) {
        return Err(SkipReason::OutsideValidityWindow);
    }

    let source_type = match &assignment.subject_type {
        SubjectTag::Known(kind) => *kind,
        SubjectTag::Unrecognized(tag) => {
            return Err(SkipReason::UnrecognizedSubjectType { tag: tag.clone() });
        }
    };
    if !allowed.contains(source_type, &assignment.subject_id) {
        return Err(SkipReason::SubjectNotHeld {
            subject_type: source_type,
            subject_id: assignment.subject_id.clone(),
        });
    }

    let Some(entitlement) = catalog.get(assignment.entitlement_id.as_str()) else {
        return Err(SkipReason::UnknownEntitlement {
            entitlement_id: assignment.entitlement_id.clone(),
        });
    };

    Ok(EffectiveAccessGrant {
        entitlement_id: entitlement.id.clone(),
        resource_id: entitlement.resource_id.clone(),
        source_type,
        source_id: assignment.subject_id.clone(),
        source_label: source_type.label().to_string(),
        scope: assignment.scope.clone(),
        assignment_id: assignment.id.clone(),
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{Scope, ValidityWindow};
    use crate::catalog::Entitlement;

    fn catalog() -> EntitlementCatalog {
        [
            Entitlement::new("e1", "r-erp", "Admin").with_external_group("grp-admins"),
            Entitlement::new("e2", "r-crm", "Read"),
        ]
        .into_iter()
        .collect()
    }

    fn identity() -> IdentityContext {
        IdentityContext::new("u1")
            .with_position("pos-1")
            .with_job_title("jp-dev")
            .with_capability("fire-warden")
    }

    fn as_of() -> AsOf {
        AsOf::parse("2024-05-01T12:00:00Z")
    }

    fn direct(assignments: Vec<EntitlementAssignment>) -> AssignmentCollection {
        AssignmentCollection::new(Vec::new(), assignments)
    }

    #[test]
    fn direct_person_assignment_is_granted() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Person, "u1");
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());

        assert_eq!(resolution.grants.len(), 1);
        let grant = &resolution.grants[0];
        assert_eq!(grant.entitlement_id.as_str(), "e1");
        assert_eq!(grant.resource_id.as_str(), "r-erp");
        assert_eq!(grant.source_type, SubjectType::Person);
        assert_eq!(grant.source_id.as_str(), "u1");
        assert_eq!(grant.source_label, "Person");
        assert_eq!(grant.origin, AssignmentOrigin::Direct);
        assert!(resolution.skipped.is_empty());
    }

    #[test]
    fn pending_removal_is_not_effective() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Person, "u1")
            .with_status("pending_removal".parse().unwrap());
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());

        assert!(resolution.grants.is_empty());
        assert_eq!(
            resolution.skipped[0].reason,
            SkipReason::IneffectiveStatus {
                status: AssignmentStatus::Other("pending_removal".to_string())
            }
        );
    }

    #[test]
    fn approved_counts_as_effective() {
        let a = EntitlementAssignment::new("a1", "e2", SubjectType::JobTitle, "jp-dev")
            .with_status(AssignmentStatus::Approved);
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());
        assert_eq!(resolution.grants[0].source_label, "Job Profile");
    }

    #[test]
    fn unknown_entitlement_is_skipped_silently() {
        let a = EntitlementAssignment::new("a1", "e99", SubjectType::Person, "u1");
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());

        assert!(resolution.grants.is_empty());
        assert_eq!(
            resolution.skip_counts().get(&SkipKind::UnknownEntitlement),
            Some(&1)
        );
    }

    #[test]
    fn unrecognized_subject_type_is_skipped() {
        let mut a = EntitlementAssignment::new("a1", "e1", SubjectType::Person, "u1");
        a.subject_type = SubjectTag::Unrecognized("department".to_string());
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());

        assert!(resolution.grants.is_empty());
        assert!(matches!(
            &resolution.skipped[0].reason,
            SkipReason::UnrecognizedSubjectType { tag } if tag == "department"
        ));
    }

    #[test]
    fn subject_of_another_person_is_not_held() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Position, "pos-2");
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());
        assert_eq!(resolution.skipped[0].reason.kind(), SkipKind::SubjectNotHeld);
    }

    #[test]
    fn status_is_checked_before_validity() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Person, "u1")
            .with_status(AssignmentStatus::Revoked)
            .with_validity(ValidityWindow::between("2000-01-01", "2000-12-31"));
        let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());
        assert_eq!(resolution.skipped[0].reason.kind(), SkipKind::IneffectiveStatus);
    }

    #[test]
    fn multiple_sources_yield_distinct_grants_in_order() {
        let inherited = vec![
            EntitlementAssignment::new("i1", "e1", SubjectType::Position, "pos-1"),
            EntitlementAssignment::new("i2", "e1", SubjectType::Capability, "fire-warden")
                .with_scope(Scope {
                    org_unit_id: Some("ou-hq".to_string()),
                    include_children: true,
                    resource_context: None,
                }),
        ];
        let direct = vec![EntitlementAssignment::new("d1", "e1", SubjectType::Person, "u1")];
        let assignments = AssignmentCollection::new(inherited, direct);

        let resolution = resolve(&identity(), &assignments, &catalog(), &as_of());

        let ids: Vec<&str> = resolution.grants.iter().map(|g| g.assignment_id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i2", "d1"]);
        assert_eq!(resolution.grants_for("e1").count(), 3);
        assert_eq!(resolution.entitlement_ids().len(), 1);
        assert_eq!(resolution.grants[1].scope.org_unit_id.as_deref(), Some("ou-hq"));
        assert!(resolution.grants[1].scope.include_children);
    }

    #[test]
    fn custom_effective_statuses() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Person, "u1")
            .with_status(AssignmentStatus::Approved);
        let config = ResolverConfig::default().with_effective_statuses([AssignmentStatus::Active]);
        let resolution = resolve_with(&identity(), &direct(vec![a]), &catalog(), &as_of(), &config);
        assert!(resolution.grants.is_empty());
    }

    #[test]
    fn screening_sets_aside_records_no_identity_can_use() {
        let mut department = EntitlementAssignment::new("d2", "e1", SubjectType::Person, "u1");
        department.subject_type = SubjectTag::Unrecognized("department".to_string());
        let assignments = AssignmentCollection::new(
            vec![
                EntitlementAssignment::new("i1", "e1", SubjectType::Position, "pos-9"),
                EntitlementAssignment::new("i2", "e99", SubjectType::Position, "pos-1"),
            ],
            vec![
                department,
                EntitlementAssignment::new("d1", "e2", SubjectType::Person, "u7")
                    .with_status(AssignmentStatus::Revoked),
            ],
        );

        let screened = screen_records(&assignments, &catalog());

        let kept: Vec<(AssignmentOrigin, &str)> =
            screened.assignments.iter().map(|(o, a)| (o, a.id.as_str())).collect();
        assert_eq!(
            kept,
            vec![(AssignmentOrigin::Inherited, "i1"), (AssignmentOrigin::Direct, "d1")]
        );
        let malformed: Vec<(&str, SkipKind)> = screened
            .malformed
            .iter()
            .map(|s| (s.assignment_id.as_str(), s.reason.kind()))
            .collect();
        assert_eq!(
            malformed,
            vec![("i2", SkipKind::UnknownEntitlement), ("d2", SkipKind::UnrecognizedSubjectType)]
        );
    }

    #[test]
    fn explain_matches_resolution() {
        let a = EntitlementAssignment::new("a1", "e1", SubjectType::Position, "pos-1")
            .with_validity(ValidityWindow::between("2025-01-01", "2025-12-31"));
        let err = explain(
            &identity(),
            &a,
            AssignmentOrigin::Inherited,
            &catalog(),
            &as_of(),
            &ResolverConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, SkipReason::OutsideValidityWindow);
        assert_eq!(err.to_string(), "outside validity window");
    }

    #[test]
    fn skip_reason_serializes_with_kind_tag() {
        let reason = SkipReason::UnknownEntitlement {
            entitlement_id: EntitlementId::new("e99"),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "unknown_entitlement");
        assert_eq!(json["entitlement_id"], "e99");
    }

    mod proptest_tests {
        use super::*;
        use chrono::{Duration, TimeZone, Utc};
        use proptest::prelude::*;

        fn status_strategy() -> impl Strategy<Value = AssignmentStatus> {
            prop_oneof![
                Just(AssignmentStatus::Active),
                Just(AssignmentStatus::Approved),
                Just(AssignmentStatus::Pending),
                Just(AssignmentStatus::Revoked),
                "[a-z_]{1,12}".prop_map(|s| AssignmentStatus::from(s)),
            ]
        }

        fn subject_strategy() -> impl Strategy<Value = (SubjectType, String)> {
            prop_oneof![
                Just((SubjectType::Person, "u1".to_string())),
                Just((SubjectType::Person, "u2".to_string())),
                Just((SubjectType::Position, "pos-1".to_string())),
                Just((SubjectType::JobTitle, "jp-dev".to_string())),
                Just((SubjectType::JobTitle, "jp-ops".to_string())),
                Just((SubjectType::Capability, "fire-warden".to_string())),
            ]
        }

        fn assignment_strategy() -> impl Strategy<Value = EntitlementAssignment> {
            (
                0u32..1000,
                prop_oneof![Just("e1"), Just("e2"), Just("e99")],
                subject_strategy(),
                status_strategy(),
                proptest::option::of(-400i64..400),
                proptest::option::of(-400i64..400),
            )
                .prop_map(|(n, entitlement, (kind, subject), status, from, until)| {
                    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
                    EntitlementAssignment::new(format!("a{n}"), entitlement, kind, subject)
                        .with_status(status)
                        .with_validity(ValidityWindow {
                            valid_from: from.map(|d| (base + Duration::days(d)).to_rfc3339()),
                            valid_until: until.map(|d| (base + Duration::days(d)).to_rfc3339()),
                        })
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: every assignment is accounted for exactly once, as a grant or a skip.
            #[test]
            fn every_assignment_is_granted_or_skipped(
                inherited in prop::collection::vec(assignment_strategy(), 0..12),
                direct in prop::collection::vec(assignment_strategy(), 0..12),
            ) {
                let assignments = AssignmentCollection::new(inherited, direct);
                let resolution = resolve(&identity(), &assignments, &catalog(), &as_of());
                prop_assert_eq!(resolution.grants.len() + resolution.skipped.len(), assignments.len());
            }

            /// Property: ineffective statuses never produce grants.
            #[test]
            fn ineffective_status_never_grants(
                a in assignment_strategy(),
                revoked in any::<bool>(),
            ) {
                let status = if revoked { AssignmentStatus::Revoked } else { AssignmentStatus::Pending };
                let a = a.with_status(status);
                let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());
                prop_assert!(resolution.grants.is_empty());
            }

            /// Property: an effective, held, in-window assignment yields exactly one grant
            /// attributed to its subject.
            #[test]
            fn eligible_assignment_yields_one_grant(
                (kind, subject) in subject_strategy().prop_filter("held subject", |(k, s)| {
                    AllowedSubjects::build(&identity()).contains(*k, &SubjectId::new(s.clone()))
                }),
                approved in any::<bool>(),
                before in 0i64..400,
                after in 0i64..400,
            ) {
                let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
                let status = if approved { AssignmentStatus::Approved } else { AssignmentStatus::Active };
                let a = EntitlementAssignment::new("a1", "e2", kind, subject.clone())
                    .with_status(status)
                    .with_validity(ValidityWindow::between(
                        (base - Duration::days(before)).to_rfc3339(),
                        (base + Duration::days(after)).to_rfc3339(),
                    ));

                let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of());
                prop_assert_eq!(resolution.grants.len(), 1);
                prop_assert_eq!(resolution.grants[0].source_type, kind);
                prop_assert_eq!(resolution.grants[0].source_id.as_str(), subject.as_str());
            }

            /// Property: an unparsable reference instant lets every window pass.
            #[test]
            fn unparsable_as_of_ignores_windows(
                a in assignment_strategy(),
                garbage in "[a-z ]{1,16}",
            ) {
                let as_of = AsOf::parse(&garbage);
                prop_assume!(!as_of.is_parsed());
                let a = a.with_status(AssignmentStatus::Active);
                let resolution = resolve(&identity(), &direct(vec![a]), &catalog(), &as_of);
                prop_assert!(
                    !resolution.skipped.iter().any(|s| s.reason == SkipReason::OutsideValidityWindow)
                );
            }

            /// Property: resolution is deterministic.
            #[test]
            fn resolve_is_deterministic(
                inherited in prop::collection::vec(assignment_strategy(), 0..8),
                direct in prop::collection::vec(assignment_strategy(), 0..8),
            ) {
                let assignments = AssignmentCollection::new(inherited, direct);
                let first = resolve(&identity(), &assignments, &catalog(), &as_of());
                let second = resolve(&identity(), &assignments, &catalog(), &as_of());
                prop_assert_eq!(first, second);
            }
        }
    }
}
