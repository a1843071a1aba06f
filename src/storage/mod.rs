//! Persistence layer.
//!
//! The whole campaign store is snapshotted to one JSON file. At
//! single-campaign scale rewriting the full snapshot on every save is
//! simpler and safer than incremental persistence; the file location comes
//! from configuration (`AppConfig::storage`).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::store::CampaignStore;

/// Write the store as pretty-printed JSON, replacing any previous snapshot.
pub fn save_store(store: &CampaignStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(store)
        .context("Campaign store did not serialise")?;
    fs::write(path, json)
        .with_context(|| format!("Could not write snapshot {}", path.display()))?;

    debug!(path = %path.display(), rosters = store.rosters().count(), "Store saved");
    Ok(())
}

/// Read a snapshot back. A missing file means a fresh start, not an error.
pub fn load_store(path: impl AsRef<Path>) -> Result<Option<CampaignStore>> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No snapshot found, starting fresh");
        return Ok(None);
    }

    let json = fs::read_to_string(path)
        .with_context(|| format!("Could not read snapshot {}", path.display()))?;
    let store: CampaignStore = serde_json::from_str(&json)
        .with_context(|| format!("Snapshot {} did not parse", path.display()))?;

    info!(path = %path.display(), rosters = store.rosters().count(), "Store loaded");
    Ok(Some(store))
}

/// Remove a snapshot, ignoring a file that is already gone.
pub fn delete_store(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Could not delete snapshot {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
