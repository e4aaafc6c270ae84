//! Batch input sources
//!
//! Files and stdin are read completely before the pipeline runs.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

/// Source name meaning standard input
pub const STDIN_SOURCE: &str = "-";

/// Read a whole batch from a file path, or from stdin for `-`
pub async fn read_batch(source: &str) -> Result<String> {
    if source == STDIN_SOURCE {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read batch from stdin")?;
        return Ok(text);
    }

    read_file(Path::new(source)).await
}

pub async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
