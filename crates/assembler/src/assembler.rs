//! The exam assembler.
//!
//! For each blueprint task the assembler gathers candidates from the
//! question pool, ranks them against the user's history, de-duplicates by
//! family, and takes the top `need` items. Tasks are independent, so their
//! fetch-and-rank pipelines run concurrently (bounded by
//! `max_concurrent_tasks`) and are joined back in blueprint order.
//!
//! Every task is evaluated before the result is decided: a short task yields
//! a [`DeficitDetail`] and the run continues, so one failed assembly reports
//! every shortfall at once. Collaborator failures are not deficits and abort
//! the run as `IoFailure` as soon as the first one completes.

use examforge_config::AssemblyConfig;
use examforge_core::{
    AssemblyError, Blueprint, DeficitDetail, Exam, ExamSection, Locale, Question, QuestionPool,
    Result, TaskSpec, UserHistory,
};
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ranking::{self, Candidate};

/// Result of one task's pipeline.
enum TaskOutcome {
    Filled(ExamSection),
    Short(DeficitDetail),
}

/// Assembles exams from blueprints, a question pool, and user history.
pub struct ExamAssembler {
    pool: Arc<dyn QuestionPool>,
    history: Arc<dyn UserHistory>,
    reference_locale: Locale,
    default_locale: Locale,
    max_concurrent_tasks: usize,
}

impl ExamAssembler {
    /// An assembler with default settings (English reference locale).
    pub fn new(pool: Arc<dyn QuestionPool>, history: Arc<dyn UserHistory>) -> Self {
        let defaults = AssemblyConfig::default();
        Self {
            pool,
            history,
            reference_locale: Locale::parse(&defaults.reference_locale),
            default_locale: Locale::parse(&defaults.default_locale),
            max_concurrent_tasks: defaults.max_concurrent_tasks,
        }
    }

    /// Apply locale and concurrency settings from configuration.
    pub fn with_config(mut self, config: &AssemblyConfig) -> Self {
        self.reference_locale = Locale::parse(&config.reference_locale);
        self.default_locale = Locale::normalize(&config.default_locale, self.reference_locale.as_str());
        self.max_concurrent_tasks = config.max_concurrent_tasks.max(1);
        self
    }

    pub fn reference_locale(&self) -> &Locale {
        &self.reference_locale
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Assemble a complete exam, or fail with every task's shortfall.
    pub async fn assemble(&self, blueprint: &Blueprint, user_id: &str, locale: &str) -> Result<Exam> {
        let locale = Locale::normalize(locale, self.default_locale.as_str());
        info!(
            blueprint_id = %blueprint.id(),
            locale = %locale,
            tasks = blueprint.task_count(),
            pool = self.pool.name(),
            history = self.history.name(),
            "Assembling exam"
        );

        if blueprint.is_empty() {
            return Exam::new(blueprint, locale, Vec::new());
        }

        // Completion order; the first collaborator error ends the run at once.
        let requested = &locale;
        let mut outcomes: Vec<(usize, TaskOutcome)> =
            stream::iter(blueprint.tasks().iter().enumerate())
                .map(move |(index, task)| async move {
                    self.run_task(task, user_id, requested)
                        .await
                        .map(|outcome| (index, outcome))
                })
                .buffer_unordered(self.max_concurrent_tasks)
                .try_collect()
                .await
                .inspect_err(|e| {
                    warn!(blueprint_id = %blueprint.id(), kind = e.kind(), error = %e, "Assembly aborted");
                })?;
        outcomes.sort_unstable_by_key(|(index, _)| *index);

        let mut sections = Vec::with_capacity(outcomes.len());
        let mut deficits = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                TaskOutcome::Filled(section) => sections.push(section),
                TaskOutcome::Short(detail) => deficits.push(detail),
            }
        }

        if !deficits.is_empty() {
            warn!(
                blueprint_id = %blueprint.id(),
                locale = %locale,
                short_tasks = deficits.len(),
                "Exam assembly failed with deficits"
            );
            return Err(AssemblyError::Deficit { details: deficits });
        }

        let exam = Exam::new(blueprint, locale, sections)?;
        info!(
            blueprint_id = %exam.blueprint_id(),
            questions = exam.len(),
            fingerprint = %exam.fingerprint(),
            "Exam assembled"
        );
        Ok(exam)
    }

    /// Fill a single task, reporting a shortfall as `QuotaExceeded`.
    pub async fn assemble_task(
        &self,
        task: &TaskSpec,
        user_id: &str,
        locale: &str,
    ) -> Result<Vec<Question>> {
        let locale = Locale::normalize(locale, self.default_locale.as_str());
        match self.run_task(task, user_id, &locale).await? {
            TaskOutcome::Filled(section) => Ok(section.questions),
            TaskOutcome::Short(detail) => Err(AssemblyError::QuotaExceeded {
                task_id: detail.task_id,
                required: detail.need,
                have: detail.have,
            }),
        }
    }

    async fn run_task(&self, task: &TaskSpec, user_id: &str, locale: &Locale) -> Result<TaskOutcome> {
        if task.need == 0 {
            return Ok(TaskOutcome::Filled(ExamSection {
                task_id: task.task_id.clone(),
                questions: Vec::new(),
                unseen: 0,
                used_fallback: false,
            }));
        }

        let candidates = self.gather(task, locale).await?;
        let pool_size = candidates.len();

        let stats = if candidates.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<String> = candidates.iter().map(|c| c.question.id.clone()).collect();
            self.history.stats_for(user_id, &ids).await?
        };

        let ranked = ranking::rank(candidates, &stats, task.dedupe_by_family);
        if ranked.len() < task.need {
            let detail = DeficitDetail::new(
                &task.task_id,
                task.need,
                ranked.len(),
                locale.as_str(),
                task.dedupe_by_family && ranked.family_duplicates,
            );
            warn!(
                task_id = %task.task_id,
                locale = %locale,
                need = task.need,
                have = detail.have,
                missing = detail.missing,
                family_duplicates = detail.family_duplicates_encountered,
                "Task short of eligible items"
            );
            return Ok(TaskOutcome::Short(detail));
        }

        let eligible = ranked.len();
        let family_duplicates = ranked.family_duplicates;
        let selected: Vec<Candidate> = ranked.candidates.into_iter().take(task.need).collect();
        let unseen = selected
            .iter()
            .filter(|c| stats.get(&c.question.id).is_none_or(|s| s.is_unseen()))
            .count();
        let used_fallback = selected.iter().any(|c| c.fallback);

        info!(
            task_id = %task.task_id,
            need = task.need,
            pool = pool_size,
            eligible,
            selected = selected.len(),
            unseen,
            reused = selected.len() - unseen,
            fallback_used = used_fallback,
            family_duplicates,
            "Task filled"
        );

        Ok(TaskOutcome::Filled(ExamSection {
            task_id: task.task_id.clone(),
            questions: selected.into_iter().map(|c| c.question).collect(),
            unseen,
            used_fallback,
        }))
    }

    /// Candidates in the requested locale, plus reference-locale items when
    /// the task's policy allows it and the requested locale alone is short.
    async fn gather(&self, task: &TaskSpec, locale: &Locale) -> Result<Vec<Candidate>> {
        let primary: Vec<Question> = self
            .pool
            .list_candidates(&task.task_id, locale.as_str(), false)
            .await?
            .into_iter()
            .filter(|q| q.task_id == task.task_id && locale.matches(&q.locale))
            .collect();

        let needs_fallback = task.locale_policy.allows_fallback()
            && *locale != self.reference_locale
            && ranking::eligible_count(&primary, task.dedupe_by_family) < task.need;

        let fallback: Vec<Question> = if needs_fallback {
            let fetched = self
                .pool
                .list_candidates(&task.task_id, locale.as_str(), true)
                .await?;
            let known: HashSet<&str> = primary.iter().map(|q| q.id.as_str()).collect();
            let extra: Vec<Question> = fetched
                .into_iter()
                .filter(|q| {
                    q.task_id == task.task_id
                        && self.reference_locale.matches(&q.locale)
                        && !known.contains(q.id.as_str())
                })
                .collect();
            debug!(
                task_id = %task.task_id,
                locale = %locale,
                reference = %self.reference_locale,
                primary = primary.len(),
                fallback = extra.len(),
                "Reference locale fallback queried"
            );
            extra
        } else {
            Vec::new()
        };

        Ok(primary
            .into_iter()
            .map(|question| Candidate {
                question,
                fallback: false,
            })
            .chain(fallback.into_iter().map(|question| Candidate {
                question,
                fallback: true,
            }))
            .collect())
    }
}
