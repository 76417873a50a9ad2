//! In-memory user history aggregated from answer records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use examforge_core::{ItemStats, Result, UserHistory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::jsonl;

/// One answered question, as written to the answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user_id: String,
    pub question_id: String,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

type StatsByQuestion = HashMap<String, ItemStats>;

/// Per-user item statistics held in memory.
pub struct InMemoryUserHistory {
    users: Arc<RwLock<HashMap<String, StatsByQuestion>>>,
}

impl InMemoryUserHistory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnswerRecord>) -> Self {
        let mut users = HashMap::new();
        for record in records {
            apply(&mut users, record);
        }
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Aggregate a JSON-lines answer log. A missing file is an empty history.
    pub async fn load_jsonl(path: &Path) -> Result<Self> {
        let Some(content) = jsonl::read_optional(path).await? else {
            debug!(path = %path.display(), "No answer log, starting with empty history");
            return Ok(Self::new());
        };
        let records: Vec<AnswerRecord> = jsonl::parse_lines(&content, path);
        debug!(path = %path.display(), records = records.len(), "Answer log loaded");
        Ok(Self::from_records(&records))
    }

    pub async fn record(&self, answer: &AnswerRecord) {
        apply(&mut *self.users.write().await, answer);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for InMemoryUserHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(users: &mut HashMap<String, StatsByQuestion>, answer: &AnswerRecord) {
    let stats = users
        .entry(answer.user_id.clone())
        .or_default()
        .entry(answer.question_id.clone())
        .or_default();
    stats.attempts = stats.attempts.saturating_add(1);
    if answer.correct {
        stats.correct = stats.correct.saturating_add(1);
    }
    stats.last_seen_at = stats.last_seen_at.max(Some(answer.answered_at));
}

#[async_trait]
impl UserHistory for InMemoryUserHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn stats_for(
        &self,
        user_id: &str,
        question_ids: &[String],
    ) -> Result<HashMap<String, ItemStats>> {
        let users = self.users.read().await;
        let Some(stats) = users.get(user_id) else {
            return Ok(HashMap::new());
        };
        Ok(question_ids
            .iter()
            .filter_map(|id| stats.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }
}
