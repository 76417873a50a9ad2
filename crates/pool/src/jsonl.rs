//! JSON-lines reading shared by the file-loaded backends.

use examforge_core::{AssemblyError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::warn;

/// Read `path`; `Ok(None)` when the file does not exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AssemblyError::io(e)),
    }
}

/// Parse one record per non-blank line, skipping lines that fail to decode.
pub(crate) fn parse_lines<T: DeserializeOwned>(content: &str, path: &Path) -> Vec<T> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<T>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), line = index + 1, error = %e, "Skipping corrupt line");
                None
            }
        })
        .collect()
}
