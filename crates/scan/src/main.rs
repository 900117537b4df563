use anyhow::Context;
use chrono::Utc;

use accessgov_scan::{AccessSnapshot, ScanSettings, run_scan, write_json_lines};

fn main() -> anyhow::Result<()> {
    accessgov_observability::init();

    let settings = ScanSettings::from_env_and_args(std::env::args().skip(1), Utc::now())
        .context("invalid scan settings")?;
    tracing::info!(
        snapshot = %settings.snapshot_path.display(),
        as_of = %settings.as_of,
        "starting drift scan"
    );

    let snapshot = AccessSnapshot::load(&settings.snapshot_path)?;
    let batch = run_scan(&snapshot, &settings);

    write_json_lines(&batch.scans, std::io::stdout().lock())
}
