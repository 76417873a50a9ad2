//! # ExamForge Assembler
//!
//! Blueprint-driven exam assembly: candidate gathering with locale
//! fallback, family de-duplication, history-aware ranking, and aggregated
//! deficit reporting. Also hosts practice-scope quota distribution.

pub mod assembler;
pub mod quota;
pub mod ranking;

pub use assembler::ExamAssembler;
pub use quota::{QuotaDistributor, practice_scope};
pub use ranking::{Candidate, RankedSet};
