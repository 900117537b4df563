//! `accessgov-scan` — batch drift scan over an exported snapshot.
//!
//! This is the outer harness around the pure evaluator crates: it is the only
//! place that touches files, the environment or the clock.

pub mod settings;
pub mod snapshot;

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Context;

use accessgov_drift::{BatchScan, DriftScanner, IdentityScan};

pub use settings::ScanSettings;
pub use snapshot::AccessSnapshot;

/// Scan every identity in `snapshot`, in snapshot order.
///
/// Identities without a directory observation are scanned against an empty
/// group set. Malformed assignment records are reported once for the batch.
pub fn run_scan(snapshot: &AccessSnapshot, settings: &ScanSettings) -> BatchScan {
    let catalog = snapshot.catalog();
    let scanner = DriftScanner::new(&catalog).with_weights(settings.weights);
    let observed = snapshot.observed_groups();
    let nothing_observed = BTreeSet::new();

    let members = snapshot.identities.iter().map(|identity| {
        let groups = observed.get(&identity.person_id).unwrap_or_else(|| {
            tracing::warn!(person_id = %identity.person_id, "no directory observation for identity");
            &nothing_observed
        });
        (identity, groups)
    });

    let batch = scanner.scan_population(&snapshot.assignments, members, &settings.as_of);

    tracing::info!(
        identities = batch.scans.len(),
        entitlements = catalog.len(),
        assignments = snapshot.assignments.len(),
        malformed = batch.malformed.len(),
        drifted = batch.drifted(),
        "batch drift scan finished"
    );

    batch
}

/// Write one JSON document per scan, newline-delimited.
pub fn write_json_lines<W: Write>(scans: &[IdentityScan], mut out: W) -> anyhow::Result<()> {
    for scan in scans {
        serde_json::to_writer(&mut out, scan)
            .with_context(|| format!("failed to serialize scan for {}", scan.person_id))?;
        out.write_all(b"\n").context("failed to write scan output")?;
    }
    out.flush().context("failed to flush scan output")?;
    Ok(())
}
