//! Question pool trait — the data-access boundary for candidate items.

use async_trait::async_trait;

use crate::error::Result;
use crate::question::Question;

/// Supplies candidate items per (task, locale).
///
/// With `allow_reference_fallback = false` the pool returns the items of
/// `locale` only. With `true` it also returns the reference-locale items,
/// after the locale-specific ones. Locale matching inside the pool may be
/// loose; the assembler re-checks every item case-insensitively.
#[async_trait]
pub trait QuestionPool: Send + Sync {
    /// The pool backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    async fn list_candidates(
        &self,
        task_id: &str,
        locale: &str,
        allow_reference_fallback: bool,
    ) -> Result<Vec<Question>>;
}
