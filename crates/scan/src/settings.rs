//! Process settings for the scan binary.
//!
//! | variable | meaning |
//! |---|---|
//! | `ACCESSGOV_SNAPSHOT` | snapshot path (overridden by the first positional argument) |
//! | `ACCESSGOV_AS_OF` | reference instant (overridden by `--as-of`); defaults to now |
//! | `ACCESSGOV_MISSING_PENALTY` | score penalty per missing group |
//! | `ACCESSGOV_EXTRA_PENALTY` | score penalty per extra group |

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use accessgov_access::AsOf;
use accessgov_core::{DomainError, DomainResult, InstantBound, parse_instant};
use accessgov_drift::IntegrityWeights;

pub const SNAPSHOT_VAR: &str = "ACCESSGOV_SNAPSHOT";
pub const AS_OF_VAR: &str = "ACCESSGOV_AS_OF";
pub const MISSING_PENALTY_VAR: &str = "ACCESSGOV_MISSING_PENALTY";
pub const EXTRA_PENALTY_VAR: &str = "ACCESSGOV_EXTRA_PENALTY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub snapshot_path: PathBuf,
    pub as_of: AsOf,
    pub weights: IntegrityWeights,
}

impl ScanSettings {
    /// Read settings from the process environment and arguments.
    ///
    /// `now` is used when no reference instant is configured.
    pub fn from_env_and_args(args: impl IntoIterator<Item = String>, now: DateTime<Utc>) -> DomainResult<Self> {
        Self::from_lookup(args, |key| std::env::var(key).ok(), now)
    }

    /// Same as `from_env_and_args` with an injectable variable lookup.
    pub fn from_lookup<F>(args: impl IntoIterator<Item = String>, lookup: F, now: DateTime<Utc>) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut positional: Option<String> = None;
        let mut as_of_arg: Option<String> = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--as-of" {
                let value = args
                    .next()
                    .ok_or_else(|| DomainError::validation("--as-of requires a value"))?;
                as_of_arg = Some(value);
            } else if let Some(value) = arg.strip_prefix("--as-of=") {
                as_of_arg = Some(value.to_string());
            } else if arg.starts_with("--") {
                return Err(DomainError::validation(format!("unknown option {arg}")));
            } else if positional.is_none() {
                positional = Some(arg);
            } else {
                return Err(DomainError::validation(format!("unexpected argument {arg}")));
            }
        }

        let snapshot_path = positional
            .or_else(|| lookup(SNAPSHOT_VAR))
            .map(PathBuf::from)
            .ok_or_else(|| DomainError::validation(format!("no snapshot given (argument or {SNAPSHOT_VAR})")))?;

        // Unlike the evaluator, a scan run rejects a malformed instant.
        let as_of = match as_of_arg.or_else(|| lookup(AS_OF_VAR)) {
            Some(raw) => AsOf::Instant(parse_instant(&raw, InstantBound::Start)?),
            None => AsOf::Instant(now),
        };

        let defaults = IntegrityWeights::default();
        let weights = IntegrityWeights::default()
            .with_missing_penalty(penalty(&lookup, MISSING_PENALTY_VAR, defaults.missing_penalty)?)
            .with_extra_penalty(penalty(&lookup, EXTRA_PENALTY_VAR, defaults.extra_penalty)?);

        Ok(Self {
            snapshot_path,
            as_of,
            weights,
        })
    }
}

fn penalty<F>(lookup: &F, key: &str, default: u32) -> DomainResult<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("{key} must be a non-negative integer, got {raw:?}"))),
    }
}
