//! Directory-backed blueprint source — one JSON document per blueprint.
//!
//! Storage layout: `<dir>/<blueprint-id>.json`

use async_trait::async_trait;
use examforge_core::{AssemblyError, Blueprint, BlueprintId, BlueprintSource, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::json;

pub struct DirectoryBlueprintSource {
    dir: PathBuf,
}

impl DirectoryBlueprintSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The document path for `id`, or `None` if the id is not a safe file stem.
    pub fn path_for(&self, id: &BlueprintId) -> Option<PathBuf> {
        is_safe_id(id.as_str()).then(|| self.dir.join(format!("{id}.json")))
    }

    /// Ids of every `*.json` document in the directory, sorted.
    pub async fn list_ids(&self) -> Result<Vec<BlueprintId>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssemblyError::not_found(self.dir.display().to_string()));
            }
            Err(e) => return Err(AssemblyError::io(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_safe_id(stem) {
                    ids.push(BlueprintId::new(stem));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[async_trait]
impl BlueprintSource for DirectoryBlueprintSource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn decode(&self, id: &BlueprintId) -> Result<Blueprint> {
        let Some(path) = self.path_for(id) else {
            return Err(AssemblyError::not_found(format!("{}/{id}", self.dir.display())));
        };
        let origin = path.display().to_string();

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssemblyError::not_found(origin));
            }
            Err(e) => return Err(AssemblyError::io(e)),
        };

        debug!(blueprint_id = %id, path = %origin, bytes = text.len(), "Blueprint document read");
        json::decode_document(id, &text, &origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"id":"b1","questionCount":3,"blocks":[{"id":"A","tasks":[{"id":"A-1","quota":3}]}]}"#;

    #[tokio::test]
    async fn decodes_document_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b1.json"), DOC).unwrap();

        let source = DirectoryBlueprintSource::new(dir.path());
        let bp = source.decode(&"b1".into()).await.unwrap();
        assert_eq!(bp.total_need(), 3);
    }

    #[tokio::test]
    async fn missing_document_is_content_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryBlueprintSource::new(dir.path());
        let err = source.decode(&"absent".into()).await.unwrap_err();
        match err {
            AssemblyError::ContentNotFound { path } => assert!(path.ends_with("absent.json")),
            other => panic!("expected ContentNotFound, got {other}"),
        }
    }

    #[tokio::test]
    async fn unsafe_ids_never_touch_the_filesystem() {
        let source = DirectoryBlueprintSource::new("/srv/blueprints");
        for id in ["../etc/passwd", ".hidden", "a/b", ""] {
            let err = source.decode(&id.into()).await.unwrap_err();
            assert!(matches!(err, AssemblyError::ContentNotFound { .. }), "{id}");
        }
    }

    #[tokio::test]
    async fn malformed_document_is_schema_violation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{\"blocks\": 3").unwrap();
        let source = DirectoryBlueprintSource::new(dir.path());
        let err = source.decode(&"bad".into()).await.unwrap_err();
        assert!(matches!(err, AssemblyError::SchemaViolation { .. }));
    }

    #[tokio::test]
    async fn lists_json_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b2.json"), DOC).unwrap();
        std::fs::write(dir.path().join("b1.json"), DOC).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let source = DirectoryBlueprintSource::new(dir.path());
        let ids = source.list_ids().await.unwrap();
        assert_eq!(ids, vec![BlueprintId::from("b1"), BlueprintId::from("b2")]);

        let missing = DirectoryBlueprintSource::new(dir.path().join("nope"));
        assert!(matches!(
            missing.list_ids().await,
            Err(AssemblyError::ContentNotFound { .. })
        ));
    }
}
