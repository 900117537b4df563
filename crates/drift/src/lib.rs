//! `accessgov-drift` — directory drift reconciliation.
//!
//! Translates resolved grants into external directory groups and diffs them
//! against what the directory actually shows. Only groups that some
//! entitlement maps to are within this system's authority; anything else the
//! directory reports is ignored.

pub mod detect;
pub mod scan;
pub mod translate;

pub use detect::{DirectoryObservation, DriftReport, IntegrityWeights, diff, diff_with};
pub use scan::{BatchScan, DriftScanner, IdentityScan, ScanSubject};
pub use translate::{DriftFinding, FindingKind, attribute_findings, managed_groups, to_target_groups};
