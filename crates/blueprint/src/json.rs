//! JSON blueprint documents.
//!
//! ```json
//! {
//!   "id": "welder-a",
//!   "questionCount": 6,
//!   "blocks": [
//!     { "id": "A", "title": "Safety",
//!       "tasks": [ { "id": "A-1", "quota": 4 },
//!                  { "id": "A-2", "quota": 2, "localePolicy": "fallback" } ] }
//!   ]
//! }
//! ```
//!
//! Tasks are flattened in block order. `questionCount` must equal the sum
//! of all quotas. Unknown fields are ignored.

use examforge_core::{AssemblyError, Blueprint, BlueprintId, LocalePolicy, Result, TaskSpec};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlueprintDocument {
    #[serde(default)]
    id: String,
    question_count: usize,
    #[serde(default)]
    blocks: Vec<BlockDocument>,
}

#[derive(Debug, Deserialize)]
struct BlockDocument {
    id: String,
    #[serde(default)]
    tasks: Vec<TaskDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    id: String,
    quota: usize,
    #[serde(default)]
    locale_policy: LocalePolicy,
    #[serde(default = "default_dedupe")]
    dedupe_by_family: bool,
}

fn default_dedupe() -> bool {
    true
}

/// Decode and validate a blueprint document.
///
/// `origin` names where the text came from (a file path, usually) and
/// prefixes every `SchemaViolation` path.
pub fn decode_document(id: &BlueprintId, text: &str, origin: &str) -> Result<Blueprint> {
    let doc: BlueprintDocument = serde_json::from_str(text)
        .map_err(|e| AssemblyError::schema(origin, format!("malformed blueprint document: {e}")))?;

    let doc_id = doc.id.trim();
    if !doc_id.is_empty() && doc_id != id.as_str() {
        return Err(AssemblyError::schema(
            format!("{origin}#/id"),
            format!("document id {doc_id} does not match requested id {id}"),
        ));
    }

    if doc.blocks.is_empty() {
        return Err(AssemblyError::schema(
            format!("{origin}#/blocks"),
            "blueprint must have at least one block",
        ));
    }

    let mut block_ids = HashSet::with_capacity(doc.blocks.len());
    let mut tasks = Vec::new();
    for (b, block) in doc.blocks.into_iter().enumerate() {
        let block_id = block.id.trim().to_string();
        if block_id.is_empty() || !block_ids.insert(block_id.clone()) {
            return Err(AssemblyError::schema(
                format!("{origin}#/blocks[{b}]/id"),
                format!("block id '{}' is blank or duplicated", block.id),
            ));
        }
        for (t, task) in block.tasks.into_iter().enumerate() {
            if task.id.trim().is_empty() {
                return Err(AssemblyError::schema(
                    format!("{origin}#/blocks[{b}]/tasks[{t}]/id"),
                    "task id must not be blank",
                ));
            }
            tasks.push(
                TaskSpec::new(task.id.trim(), task.quota)
                    .with_policy(task.locale_policy)
                    .with_dedupe(task.dedupe_by_family)
                    .in_block(block_id.clone()),
            );
        }
    }

    let quota_sum = tasks
        .iter()
        .try_fold(0usize, |sum, t| sum.checked_add(t.need))
        .ok_or_else(|| {
            AssemblyError::schema(
                format!("{origin}#/questionCount"),
                "sum of task quotas overflows",
            )
        })?;
    if quota_sum != doc.question_count {
        return Err(AssemblyError::schema(
            format!("{origin}#/questionCount"),
            format!(
                "questionCount {} does not match the sum of task quotas {quota_sum}",
                doc.question_count
            ),
        ));
    }

    Blueprint::new(id.clone(), tasks).map_err(|e| match e {
        AssemblyError::SchemaViolation { path, reason } => {
            AssemblyError::schema(format!("{origin}#{path}"), reason)
        }
        other => other,
    })
}
