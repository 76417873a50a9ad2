//! In-memory question pool.

use async_trait::async_trait;
use examforge_core::{AssemblyError, Locale, Question, QuestionPool, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::jsonl;

/// A question pool that keeps every item in a Vec.
///
/// Results are sorted by id within each locale group, so repeated queries
/// over the same contents return the same sequence.
pub struct InMemoryQuestionPool {
    items: Arc<RwLock<Vec<Question>>>,
    reference_locale: Locale,
}

impl InMemoryQuestionPool {
    pub fn new() -> Self {
        Self::with_questions(Vec::new())
    }

    pub fn with_questions(items: Vec<Question>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
            reference_locale: Locale::reference(),
        }
    }

    pub fn with_reference_locale(mut self, locale: Locale) -> Self {
        self.reference_locale = locale;
        self
    }

    /// Build a pool from a JSON-lines question bank (one `Question` per line).
    ///
    /// Corrupt lines are skipped; a missing file is `ContentNotFound`.
    pub async fn load_jsonl(path: &Path) -> Result<Self> {
        let Some(content) = jsonl::read_optional(path).await? else {
            return Err(AssemblyError::not_found(path.display().to_string()));
        };
        let items: Vec<Question> = jsonl::parse_lines(&content, path);
        debug!(path = %path.display(), count = items.len(), "Question bank loaded");
        Ok(Self::with_questions(items))
    }

    pub async fn insert(&self, question: Question) {
        self.items.write().await.push(question);
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Distinct normalized locales that have at least one item.
    pub async fn locales(&self) -> Vec<String> {
        let items = self.items.read().await;
        items
            .iter()
            .filter(|q| !q.locale.trim().is_empty())
            .map(|q| Locale::parse(&q.locale).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct task ids with at least one item, sorted.
    pub async fn task_ids(&self) -> Vec<String> {
        let items = self.items.read().await;
        items
            .iter()
            .map(|q| q.task_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn select(items: &[Question], task_id: &str, locale: &Locale) -> Vec<Question> {
        let mut selected: Vec<Question> = items
            .iter()
            .filter(|q| q.task_id == task_id && locale.matches(&q.locale))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.id.cmp(&b.id));
        selected
    }
}

impl Default for InMemoryQuestionPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionPool for InMemoryQuestionPool {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_candidates(
        &self,
        task_id: &str,
        locale: &str,
        allow_reference_fallback: bool,
    ) -> Result<Vec<Question>> {
        let locale = Locale::parse(locale);
        let items = self.items.read().await;

        let mut candidates = Self::select(&items, task_id, &locale);
        if allow_reference_fallback && locale != self.reference_locale {
            candidates.extend(Self::select(&items, task_id, &self.reference_locale));
        }
        Ok(candidates)
    }
}
