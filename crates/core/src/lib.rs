//! `accessgov-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod instant;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AssignmentId, EntitlementId, GroupId, PersonId, ResourceId, SubjectId};
pub use instant::{InstantBound, parse_instant};
