//! Local file result source.

use serde_json::Value;
use std::path::Path;

use super::SourceError;

/// Read a JSON document from disk.
pub async fn fetch_file(path: &Path) -> Result<Value, SourceError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| SourceError::Io(e.to_string()))?;
    serde_json::from_slice(&content).map_err(|e| SourceError::Malformed(e.to_string()))
}
