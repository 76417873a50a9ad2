//! Error types for exam assembly.
//!
//! Uses `thiserror` for ergonomic error definitions. `AssemblyError` is the
//! closed set of failure kinds every fallible core operation returns; it is
//! deliberately not `#[non_exhaustive]`, so callers must match every kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed collaborator error carried by [`AssemblyError::IoFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The top-level error type for all ExamForge operations.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A content location (blueprint file, question bank) does not exist.
    #[error("Content not found: {path}")]
    ContentNotFound { path: String },

    /// Decoded content is structurally invalid.
    #[error("Schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    /// A single task cannot meet its quota (single-task callers).
    #[error("Quota exceeded for task {task_id}: required {required}, have {have}")]
    QuotaExceeded {
        task_id: String,
        required: usize,
        have: usize,
    },

    /// A collaborator (pool, history, source) could not be read.
    #[error("I/O failure: {cause}")]
    IoFailure {
        #[source]
        cause: BoxError,
    },

    /// One or more tasks are short; one detail per short task, in blueprint order.
    #[error("Exam assembly deficit for {} task(s): {}", .details.len(), summarize(.details))]
    Deficit { details: Vec<DeficitDetail> },
}

/// Result type alias using our error.
pub type Result<T> = std::result::Result<T, AssemblyError>;

impl AssemblyError {
    /// Wrap a collaborator error as an `IoFailure`.
    pub fn io(cause: impl Into<BoxError>) -> Self {
        Self::IoFailure {
            cause: cause.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::ContentNotFound { path: path.into() }
    }

    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Short, stable name of the failure kind (for structured logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentNotFound { .. } => "content_not_found",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::IoFailure { .. } => "io_failure",
            Self::Deficit { .. } => "deficit",
        }
    }

    /// The deficit details, if this is a `Deficit`.
    pub fn deficit_details(&self) -> Option<&[DeficitDetail]> {
        match self {
            Self::Deficit { details } => Some(details),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssemblyError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err)
    }
}

/// Shortfall record for one task that could not satisfy its quota.
///
/// `have` counts eligible, de-duplicated candidates, which can be lower than
/// the raw candidate count when family de-duplication discarded extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeficitDetail {
    pub task_id: String,
    pub need: usize,
    pub have: usize,
    pub missing: usize,
    pub locale: String,
    pub family_duplicates_encountered: bool,
}

impl DeficitDetail {
    pub fn new(
        task_id: impl Into<String>,
        need: usize,
        have: usize,
        locale: impl Into<String>,
        family_duplicates_encountered: bool,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            need,
            have,
            missing: need.saturating_sub(have),
            locale: locale.into(),
            family_duplicates_encountered,
        }
    }
}

impl std::fmt::Display for DeficitDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} (locale {}): need {}, have {}, add {} more item(s)",
            self.task_id, self.locale, self.need, self.have, self.missing
        )?;
        if self.family_duplicates_encountered {
            write!(f, " from distinct families")?;
        }
        Ok(())
    }
}

fn summarize(details: &[DeficitDetail]) -> String {
    details
        .iter()
        .map(|d| {
            format!(
                "{}(need={}, have={}, missing={}, locale={}, famDup={})",
                d.task_id, d.need, d.have, d.missing, d.locale, d.family_duplicates_encountered
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn deficit_detail_computes_missing() {
        let detail = DeficitDetail::new("A-1", 4, 1, "ru", false);
        assert_eq!(detail.missing, 3);
    }

    #[test]
    fn deficit_detail_is_actionable() {
        let detail = DeficitDetail::new("A-1", 2, 1, "ru", true);
        let text = detail.to_string();
        assert!(text.contains("A-1"));
        assert!(text.contains("locale ru"));
        assert!(text.contains("add 1 more"));
        assert!(text.contains("distinct families"));
    }

    #[test]
    fn deficit_error_lists_every_task() {
        let err = AssemblyError::Deficit {
            details: vec![
                DeficitDetail::new("A", 3, 2, "en", false),
                DeficitDetail::new("C", 1, 0, "en", false),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 task(s)"));
        assert!(text.contains("A(need=3, have=2, missing=1"));
        assert!(text.contains("C(need=1, have=0, missing=1"));
        assert_eq!(err.kind(), "deficit");
        assert_eq!(err.deficit_details().map(<[_]>::len), Some(2));
    }

    #[test]
    fn io_failure_keeps_source() {
        let err = AssemblyError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "pool went away",
        ));
        assert_eq!(err.kind(), "io_failure");
        assert!(err.source().is_some());
        assert!(err.to_string().contains("pool went away"));
    }

    #[test]
    fn quota_exceeded_displays_counts() {
        let err = AssemblyError::QuotaExceeded {
            task_id: "B-7".into(),
            required: 15,
            have: 9,
        };
        assert!(err.to_string().contains("B-7"));
        assert!(err.to_string().contains("required 15"));
        assert!(err.deficit_details().is_none());
    }
}
