//! Tracing/logging setup shared by accessgov binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber is left
//! to the process entry point.

/// Initialize process-wide tracing with the default `info` filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Tracing configuration (filters, layers).
pub mod tracing;
