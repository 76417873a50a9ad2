//! Question items as supplied by the question pool.
//!
//! The engine never interprets `content`; it only reads the identity,
//! task, locale, and family of each item.

use serde::{Deserialize, Serialize};

/// A single question item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique item identifier
    pub id: String,

    /// The blueprint task this item belongs to
    pub task_id: String,

    /// Locale tag as stored by the pool (compared case-insensitively)
    pub locale: String,

    /// Near-duplicate family; `None` means a family of one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,

    /// Stem, choices, media — opaque to the engine
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub content: serde_json::Value,
}

impl Question {
    pub fn new(id: impl Into<String>, task_id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            locale: locale.into(),
            family_id: None,
            content: serde_json::Value::Null,
        }
    }

    pub fn with_family(mut self, family_id: impl Into<String>) -> Self {
        self.family_id = Some(family_id.into());
        self
    }

    pub fn with_content(mut self, content: serde_json::Value) -> Self {
        self.content = content;
        self
    }

    /// The family id, if this item shares a family with others.
    ///
    /// Blank family ids count as absent.
    pub fn family(&self) -> Option<&str> {
        self.family_id
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}
