//! User history trait — per-item exposure and correctness statistics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Exposure statistics for one (user, question) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    /// How many times the user answered this item
    pub attempts: u32,

    /// How many of those answers were correct
    pub correct: u32,

    /// When the item was last answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl ItemStats {
    pub fn new(attempts: u32, correct: u32, last_seen_at: Option<DateTime<Utc>>) -> Self {
        Self {
            attempts,
            correct: correct.min(attempts),
            last_seen_at,
        }
    }

    /// An item with zero attempts counts as never seen.
    pub fn is_unseen(&self) -> bool {
        self.attempts == 0
    }

    /// Fraction answered correctly, or `None` when never attempted.
    pub fn accuracy(&self) -> Option<f64> {
        (self.attempts > 0).then(|| f64::from(self.correct) / f64::from(self.attempts))
    }
}

/// Source of per-user item statistics.
///
/// Missing keys in the returned map mean "never attempted". Implementations
/// own their caching and retry policy; a failure is reported once as an
/// [`AssemblyError::IoFailure`](crate::AssemblyError::IoFailure).
#[async_trait]
pub trait UserHistory: Send + Sync {
    /// The history backend name (e.g., "in_memory", "jsonl").
    fn name(&self) -> &str;

    /// Statistics for `question_ids` as seen by `user_id`.
    async fn stats_for(
        &self,
        user_id: &str,
        question_ids: &[String],
    ) -> Result<HashMap<String, ItemStats>>;
}
