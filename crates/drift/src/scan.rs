//! Per-identity drift scans: resolve, translate, diff.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use accessgov_access::{
    AllowedSubjects, AsOf, AssignmentCollection, EntitlementCatalog, IdentityContext, Resolution, ResolverConfig,
    SkipKind, SkippedAssignment, resolve_with, screen_records,
};
use accessgov_core::{GroupId, PersonId};

use crate::detect::{DriftReport, IntegrityWeights, diff_with};
use crate::translate::{DriftFinding, attribute_findings, managed_groups, to_target_groups};

/// Inputs for scanning one identity.
#[derive(Debug, Clone, Copy)]
pub struct ScanSubject<'a> {
    pub identity: &'a IdentityContext,
    pub assignments: &'a AssignmentCollection,
    pub observed: &'a BTreeSet<GroupId>,
}

/// Outcome of scanning one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityScan {
    pub person_id: PersonId,
    pub resolution: Resolution,
    pub target_groups: BTreeSet<GroupId>,
    pub report: DriftReport,
    pub findings: Vec<DriftFinding>,
}

/// Outcome of scanning a population against one shared assignment snapshot.
///
/// `malformed` holds the records that could never grant to anyone; they are
/// reported here once and left out of every per-identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchScan {
    pub scans: Vec<IdentityScan>,
    pub malformed: Vec<SkippedAssignment>,
}

impl BatchScan {
    /// Skipped assignments per reason across the whole batch.
    pub fn skip_counts(&self) -> BTreeMap<SkipKind, usize> {
        let mut counts = BTreeMap::new();
        let skipped = self.scans.iter().flat_map(|s| &s.resolution.skipped).chain(&self.malformed);
        for skip in skipped {
            *counts.entry(skip.reason.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn drifted(&self) -> usize {
        self.scans.iter().filter(|s| !s.report.is_clean()).count()
    }
}

/// Runs drift scans against one catalog snapshot.
///
/// The managed-group set is derived once from the catalog; each scan is
/// otherwise independent, so scans may be spread across threads by the caller.
#[derive(Debug, Clone)]
pub struct DriftScanner<'c> {
    catalog: &'c EntitlementCatalog,
    managed: BTreeSet<GroupId>,
    resolver: ResolverConfig,
    weights: IntegrityWeights,
}

impl<'c> DriftScanner<'c> {
    pub fn new(catalog: &'c EntitlementCatalog) -> Self {
        Self {
            catalog,
            managed: managed_groups(catalog),
            resolver: ResolverConfig::default(),
            weights: IntegrityWeights::default(),
        }
    }

    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    pub fn with_weights(mut self, weights: IntegrityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn managed_groups(&self) -> &BTreeSet<GroupId> {
        &self.managed
    }

    pub fn scan(
        &self,
        identity: &IdentityContext,
        assignments: &AssignmentCollection,
        observed: &BTreeSet<GroupId>,
        as_of: &AsOf,
    ) -> IdentityScan {
        let span = tracing::info_span!("drift_scan", person_id = %identity.person_id);
        let _enter = span.enter();

        let resolution = resolve_with(identity, assignments, self.catalog, as_of, &self.resolver);
        let target_groups = to_target_groups(&resolution.grants, self.catalog);
        let report = diff_with(&target_groups, observed, &self.managed, &self.weights);
        let findings = attribute_findings(&report, self.catalog);

        tracing::info!(
            score = report.integrity_score,
            missing = report.missing.len(),
            extra = report.extra.len(),
            grants = resolution.grants.len(),
            skipped = resolution.skipped.len(),
            "drift scan complete"
        );

        IdentityScan {
            person_id: identity.person_id.clone(),
            resolution,
            target_groups,
            report,
            findings,
        }
    }

    /// Scan every subject in input order.
    pub fn scan_batch<'s, I>(&self, subjects: I, as_of: &AsOf) -> Vec<IdentityScan>
    where
        I: IntoIterator<Item = ScanSubject<'s>>,
    {
        if !as_of.is_parsed() {
            tracing::warn!(as_of = %as_of, "reference instant did not parse; validity windows are not enforced");
        }

        subjects
            .into_iter()
            .map(|s| self.scan(s.identity, s.assignments, s.observed, as_of))
            .collect()
    }

    /// Scan every identity against a shared assignment snapshot, in input order.
    ///
    /// Each identity is resolved only against the assignments bound to subjects
    /// it holds, so nobody's diagnostics carry other people's records.
    pub fn scan_population<'s, I>(&self, assignments: &AssignmentCollection, members: I, as_of: &AsOf) -> BatchScan
    where
        I: IntoIterator<Item = (&'s IdentityContext, &'s BTreeSet<GroupId>)>,
    {
        let screened = screen_records(assignments, self.catalog);
        for skip in &screened.malformed {
            tracing::warn!(
                assignment_id = %skip.assignment_id,
                origin = ?skip.origin,
                reason = %skip.reason,
                "skipping malformed assignment"
            );
        }

        let selections: Vec<(&IdentityContext, &BTreeSet<GroupId>, AssignmentCollection)> = members
            .into_iter()
            .map(|(identity, observed)| {
                let held = AllowedSubjects::build(identity).select(&screened.assignments);
                (identity, observed, held)
            })
            .collect();

        let scans = self.scan_batch(
            selections.iter().map(|(identity, observed, held)| ScanSubject {
                identity: *identity,
                assignments: held,
                observed: *observed,
            }),
            as_of,
        );

        BatchScan {
            scans,
            malformed: screened.malformed,
        }
    }
}
