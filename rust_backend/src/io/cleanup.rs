use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::CleanupKind;

/// Delete files directly inside `dir` whose extension matches one of `kinds`.
///
/// Returns the number of files removed. A missing directory removes nothing.
pub fn clean_data_dir(dir: &Path, kinds: &[CleanupKind]) -> Result<usize> {
    if kinds.is_empty() || !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| kinds.iter().any(|kind| kind.extension() == ext))
            .unwrap_or(false);
        if matches {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
            removed += 1;
        }
    }

    let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
    log::info!(
        "Deleted {} files in {} with extensions: {}",
        removed,
        dir.display(),
        names.join(", ")
    );
    Ok(removed)
}
