//! Registry snapshot persistence for the CLI.
//!
//! The engine state lives in a JSON snapshot file: loaded before each
//! command, rewritten after mutations. The core mandates no wire format;
//! JSON keeps snapshots inspectable.

use std::path::Path;

use anyhow::{Context, Result};
use imprint_core::{ContentRecord, EngineConfig, ProtectionEngine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    records: Vec<ContentRecord>,
}

/// Load an engine from the snapshot file, or a fresh one if it does not
/// exist yet.
pub fn load_engine(path: &Path) -> Result<ProtectionEngine> {
    let config = EngineConfig::default();
    if !path.exists() {
        return Ok(ProtectionEngine::new(config));
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read registry snapshot: {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_slice(&bytes).context("Failed to parse registry snapshot")?;
    let engine = ProtectionEngine::restore(config, snapshot.records)
        .context("Failed to restore registry from snapshot")?;
    Ok(engine)
}

/// Write the engine's records back to the snapshot file.
pub fn save_engine(path: &Path, engine: &ProtectionEngine) -> Result<()> {
    let snapshot = Snapshot {
        records: engine.registry().records()?,
    };
    let bytes = serde_json::to_vec_pretty(&snapshot).context("Failed to serialize registry")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write registry snapshot: {}", path.display()))?;
    Ok(())
}
