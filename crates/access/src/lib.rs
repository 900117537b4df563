//! `accessgov-access` — effective-access resolution.
//!
//! Pure evaluator over a point-in-time snapshot: no IO, no clock, no shared
//! state. Given one identity, the assignment streams and the entitlement
//! catalog, it decides which entitlements are authorized right now and why
//! the rest are not.

pub mod assignment;
pub mod catalog;
pub mod grant;
pub mod identity;
pub mod membership;
pub mod resolve;
pub mod subject;
pub mod validity;

pub use assignment::{
    AssignmentCollection, AssignmentOrigin, AssignmentStatus, EntitlementAssignment, Scope, ValidityWindow,
};
pub use catalog::{Entitlement, EntitlementCatalog, RiskLevel};
pub use grant::EffectiveAccessGrant;
pub use identity::IdentityContext;
pub use membership::AllowedSubjects;
pub use resolve::{
    Resolution, ResolverConfig, ScreenedAssignments, SkipKind, SkipReason, SkippedAssignment, explain, resolve,
    resolve_with, screen_records,
};
pub use subject::{SubjectTag, SubjectType};
pub use validity::{AsOf, is_valid, window_contains};
