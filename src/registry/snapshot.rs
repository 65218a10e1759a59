// JSON snapshot persistence for the registry.

use anyhow::{Context, Result};
use std::path::Path;

use crate::model::ServiceRecord;

/// Reads a snapshot file. `Ok(None)` when the file does not exist yet.
pub fn load(path: &Path) -> Result<Option<Vec<ServiceRecord>>> {
    if !path.exists() {
        return Ok(None);
    }

    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read registry snapshot {:?}", path))?;
    let list: Vec<ServiceRecord> = serde_json::from_str(&data)
        .with_context(|| format!("decode registry snapshot {:?}", path))?;
    Ok(Some(list))
}

/// Writes the full service list to the snapshot file, creating parent
/// directories as needed.
pub fn save(path: &Path, records: &[ServiceRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create snapshot directory {:?}", dir))?;
        }
    }

    let data = serde_json::to_string_pretty(records).context("encode registry snapshot")?;
    std::fs::write(path, data).with_context(|| format!("write registry snapshot {:?}", path))?;
    Ok(())
}
