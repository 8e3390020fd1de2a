use anyhow::{Context, Result};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::services::ResultTable;

/// Write every row of `table` as a pretty-printed JSON array.
pub fn write_json(table: &ResultTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), table.rows())
        .with_context(|| format!("Failed to serialize rows to {}", path.display()))?;

    log::info!("Saved rows to {}", path.display());
    Ok(())
}
