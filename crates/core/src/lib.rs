//! # ExamForge Core
//!
//! Domain types, collaborator traits, and the closed error taxonomy for the
//! ExamForge exam assembly engine. This crate performs **no I/O** — it
//! defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (question pool, user history, blueprint
//! source) is a trait here. Implementations live in their own crates, so:
//! - Storage backends can be swapped without touching the assembler
//! - Tests drive the engine with scripted fakes
//! - All crates depend inward on core

pub mod blueprint;
pub mod error;
pub mod exam;
pub mod history;
pub mod locale;
pub mod pool;
pub mod question;

// Re-export key types at crate root for ergonomics
pub use blueprint::{Blueprint, BlueprintId, BlueprintSource, LocalePolicy, TaskSpec};
pub use error::{AssemblyError, DeficitDetail, Result};
pub use exam::{Exam, ExamSection};
pub use history::{ItemStats, UserHistory};
pub use locale::{Locale, LocaleResolution, REFERENCE_LOCALE, resolve_content_locale};
pub use pool::QuestionPool;
pub use question::Question;
