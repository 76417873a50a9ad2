//! # ExamForge Pool
//!
//! Collaborator backends for the assembler:
//!
//! - [`InMemoryQuestionPool`]: question items held in memory, optionally
//!   loaded from a JSON-lines question bank
//! - [`InMemoryUserHistory`]: per-user item statistics aggregated from an
//!   answer log

pub mod history;
mod jsonl;
pub mod question_pool;

pub use history::{AnswerRecord, InMemoryUserHistory};
pub use question_pool::InMemoryQuestionPool;
