//! Temporal validity of assignments.
//!
//! Rules:
//! - absent bounds are open-ended
//! - both bounds are inclusive
//! - a bound that does not parse is ignored
//! - an unparsable reference instant makes every window pass (fail-open)

use chrono::{DateTime, Utc};

use accessgov_core::{InstantBound, parse_instant};

use crate::assignment::{EntitlementAssignment, ValidityWindow};

/// Reference instant a resolution is evaluated at.
///
/// Always passed explicitly; nothing in the evaluator reads the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsOf {
    Instant(DateTime<Utc>),
    /// Raw value that could not be parsed. Evaluation fails open.
    Unparsed(String),
}

impl AsOf {
    /// Parse an ISO-8601 reference instant. Never fails; check `is_parsed`
    /// to warn about misconfiguration before evaluating.
    pub fn parse(raw: &str) -> Self {
        match parse_instant(raw, InstantBound::Start) {
            Ok(instant) => AsOf::Instant(instant),
            Err(_) => AsOf::Unparsed(raw.to_string()),
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            AsOf::Instant(instant) => Some(*instant),
            AsOf::Unparsed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, AsOf::Instant(_))
    }
}

impl From<DateTime<Utc>> for AsOf {
    fn from(value: DateTime<Utc>) -> Self {
        AsOf::Instant(value)
    }
}

impl core::fmt::Display for AsOf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AsOf::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
            AsOf::Unparsed(raw) => write!(f, "{raw:?} (unparsed)"),
        }
    }
}

/// Whether `assignment` is temporally active at `as_of`.
pub fn is_valid(assignment: &EntitlementAssignment, as_of: &AsOf) -> bool {
    let Some(instant) = as_of.instant() else {
        return true;
    };
    window_contains(&assignment.validity, instant)
}

/// Whether `window` contains `instant`, bounds inclusive.
pub fn window_contains(window: &ValidityWindow, instant: DateTime<Utc>) -> bool {
    let from = window
        .valid_from
        .as_deref()
        .and_then(|raw| parse_bound(raw, InstantBound::Start));
    let until = window
        .valid_until
        .as_deref()
        .and_then(|raw| parse_bound(raw, InstantBound::End));

    if from.is_some_and(|from| instant < from) {
        return false;
    }
    if until.is_some_and(|until| instant > until) {
        return false;
    }
    true
}

fn parse_bound(raw: &str, bound: InstantBound) -> Option<DateTime<Utc>> {
    match parse_instant(raw, bound) {
        Ok(instant) => Some(instant),
        Err(err) => {
            tracing::debug!(bound = ?bound, error = %err, "ignoring unparsable validity bound");
            None
        }
    }
}
