//! Blueprint domain types and the blueprint source trait.
//!
//! A blueprint is an ordered list of task requirements. It is immutable once
//! constructed; [`Blueprint::new`] enforces that task ids are unique and
//! non-blank, and `need` is non-negative by type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{AssemblyError, Result};

/// Stable identifier of a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub String);

impl BlueprintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlueprintId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a task may substitute reference-locale items for missing translations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalePolicy {
    /// Only items in the requested locale are eligible
    #[default]
    Strict,
    /// Reference-locale items may fill the gap
    #[serde(alias = "fallback")]
    FallbackToReference,
}

impl LocalePolicy {
    pub fn allows_fallback(self) -> bool {
        matches!(self, Self::FallbackToReference)
    }
}

/// One section's requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,

    /// How many items this task must contribute
    pub need: usize,

    #[serde(default)]
    pub locale_policy: LocalePolicy,

    /// At most one item per family when set
    #[serde(default = "default_true")]
    pub dedupe_by_family: bool,

    /// Owning block (section group), when the source document has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TaskSpec {
    /// A strict, family-de-duplicated task.
    pub fn new(task_id: impl Into<String>, need: usize) -> Self {
        Self {
            task_id: task_id.into(),
            need,
            locale_policy: LocalePolicy::Strict,
            dedupe_by_family: true,
            block_id: None,
        }
    }

    pub fn with_policy(mut self, policy: LocalePolicy) -> Self {
        self.locale_policy = policy;
        self
    }

    pub fn with_dedupe(mut self, dedupe_by_family: bool) -> Self {
        self.dedupe_by_family = dedupe_by_family;
        self
    }

    pub fn in_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }
}

/// An ordered, validated sequence of task requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blueprint {
    id: BlueprintId,
    tasks: Vec<TaskSpec>,
}

impl Blueprint {
    /// Build a blueprint, rejecting blank or duplicate task ids and quotas
    /// whose total does not fit in `usize`.
    pub fn new(id: BlueprintId, tasks: Vec<TaskSpec>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(tasks.len());
        let mut total: usize = 0;
        for (index, task) in tasks.iter().enumerate() {
            if task.task_id.trim().is_empty() {
                return Err(AssemblyError::schema(
                    format!("{id}/tasks[{index}]"),
                    "task id must not be blank",
                ));
            }
            if !seen.insert(task.task_id.as_str()) {
                return Err(AssemblyError::schema(
                    format!("{id}/tasks[{index}]"),
                    format!("duplicate task id {}", task.task_id),
                ));
            }
            total = total.checked_add(task.need).ok_or_else(|| {
                AssemblyError::schema(
                    format!("{id}/tasks[{index}]/need"),
                    "total quota overflows",
                )
            })?;
        }
        Ok(Self { id, tasks })
    }

    pub fn id(&self) -> &BlueprintId {
        &self.id
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Size of a complete exam assembled from this blueprint. Cannot
    /// overflow: [`Blueprint::new`] rejects such quotas.
    pub fn total_need(&self) -> usize {
        self.tasks.iter().map(|t| t.need).sum()
    }
}

/// An opaque, collaborator-owned decoder of blueprints.
///
/// Malformed content is reported as `SchemaViolation`, a missing blueprint as
/// `ContentNotFound`, and transport failures as `IoFailure`.
#[async_trait]
pub trait BlueprintSource: Send + Sync {
    /// The source name (e.g., "directory").
    fn name(&self) -> &str;

    async fn decode(&self, id: &BlueprintId) -> Result<Blueprint>;
}
