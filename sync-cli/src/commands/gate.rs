//! Check feature availability.

use anyhow::Result;
use offsync_types::ConnectivityState;
use std::path::Path;

use crate::config;

/// Whether `feature` is available under the gate configured in `data_dir`.
fn check(data_dir: &Path, feature: &str, connectivity: ConnectivityState) -> Result<bool> {
    let gate = config::load(data_dir)?.feature_gate();
    Ok(gate.is_available(feature, connectivity))
}

/// Run the gate command.
pub fn run(data_dir: &Path, feature: &str, connectivity: ConnectivityState) -> Result<()> {
    if check(data_dir, feature, connectivity)? {
        println!("{}: available ({})", feature, connectivity);
    } else {
        println!("{}: unavailable ({}); will be queued", feature, connectivity);
    }
    Ok(())
}
