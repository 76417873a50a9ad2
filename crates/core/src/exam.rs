//! The assembled exam — an immutable, request-scoped result.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blueprint::{Blueprint, BlueprintId};
use crate::error::{AssemblyError, Result};
use crate::locale::Locale;
use crate::question::Question;

/// The items selected for one blueprint task, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSection {
    pub task_id: String,
    pub questions: Vec<Question>,

    /// Selected items the user had never attempted
    pub unseen: usize,

    /// Whether any selected item came from the reference locale
    pub used_fallback: bool,
}

/// A complete exam: one section per blueprint task, in blueprint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    blueprint_id: BlueprintId,
    locale: Locale,
    sections: Vec<ExamSection>,
}

impl Exam {
    /// Build an exam from one section per blueprint task, in blueprint order.
    ///
    /// A section with fewer items than its task needs (or a missing section)
    /// is `QuotaExceeded`; surplus items, foreign tasks, and misordered
    /// sections are `SchemaViolation`.
    pub fn new(blueprint: &Blueprint, locale: Locale, sections: Vec<ExamSection>) -> Result<Self> {
        let id = blueprint.id();
        if sections.len() > blueprint.task_count() {
            return Err(AssemblyError::schema(
                format!("{id}/sections[{}]", blueprint.task_count()),
                format!(
                    "{} sections for {} blueprint tasks",
                    sections.len(),
                    blueprint.task_count()
                ),
            ));
        }
        for (index, task) in blueprint.tasks().iter().enumerate() {
            let Some(section) = sections.get(index) else {
                return Err(AssemblyError::QuotaExceeded {
                    task_id: task.task_id.clone(),
                    required: task.need,
                    have: 0,
                });
            };
            if section.task_id != task.task_id {
                return Err(AssemblyError::schema(
                    format!("{id}/sections[{index}]"),
                    format!("expected task {}, found {}", task.task_id, section.task_id),
                ));
            }
            let have = section.questions.len();
            if have < task.need {
                return Err(AssemblyError::QuotaExceeded {
                    task_id: task.task_id.clone(),
                    required: task.need,
                    have,
                });
            }
            if have > task.need {
                return Err(AssemblyError::schema(
                    format!("{id}/sections[{index}]"),
                    format!("{have} items for task {} with quota {}", task.task_id, task.need),
                ));
            }
        }
        Ok(Self {
            blueprint_id: id.clone(),
            locale,
            sections,
        })
    }

    pub fn blueprint_id(&self) -> &BlueprintId {
        &self.blueprint_id
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn sections(&self) -> &[ExamSection] {
        &self.sections
    }

    pub fn section(&self, task_id: &str) -> Option<&ExamSection> {
        self.sections.iter().find(|s| s.task_id == task_id)
    }

    /// All selected questions, grouped by task in blueprint order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_ids(&self) -> Vec<&str> {
        self.questions().map(|q| q.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowercase hex SHA-256 over the blueprint id, locale, and ordered
    /// `(task, question)` pairs. Equal exams have equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.blueprint_id.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.locale.as_str().as_bytes());
        for section in &self.sections {
            for question in &section.questions {
                hasher.update([b'\n']);
                hasher.update(section.task_id.as_bytes());
                hasher.update([0u8]);
                hasher.update(question.id.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::TaskSpec;

    fn section(task: &str, ids: &[&str]) -> ExamSection {
        ExamSection {
            task_id: task.into(),
            questions: ids.iter().map(|id| Question::new(*id, task, "en")).collect(),
            unseen: ids.len(),
            used_fallback: false,
        }
    }

    fn blueprint(tasks: &[(&str, usize)]) -> Blueprint {
        Blueprint::new(
            "bp".into(),
            tasks.iter().map(|(id, need)| TaskSpec::new(*id, *need)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn questions_follow_section_order() {
        let exam = Exam::new(
            &blueprint(&[("A", 2), ("B", 1)]),
            Locale::parse("en"),
            vec![section("A", &["a2", "a1"]), section("B", &["b1"])],
        )
        .unwrap();
        assert_eq!(exam.question_ids(), vec!["a2", "a1", "b1"]);
        assert_eq!(exam.len(), 3);
        assert_eq!(exam.section("B").unwrap().questions.len(), 1);
    }

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let bp = blueprint(&[("A", 2)]);
        let exam = |ids: &[&str]| Exam::new(&bp, Locale::parse("en"), vec![section("A", ids)]).unwrap();
        let a = exam(&["1", "2"]);
        let b = exam(&["1", "2"]);
        let c = exam(&["2", "1"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn fingerprint_is_lowercase_hex_sha256() {
        let exam = Exam::new(&blueprint(&[]), Locale::reference(), vec![]).unwrap();
        let fingerprint = exam.fingerprint();
        assert_eq!(fingerprint.len(), 64);
        assert!(
            fingerprint
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert_eq!(hex::decode(&fingerprint).unwrap().len(), 32);
    }

    #[test]
    fn empty_exam() {
        let exam = Exam::new(&blueprint(&[]), Locale::reference(), vec![]).unwrap();
        assert!(exam.is_empty());
    }

    #[test]
    fn short_section_is_rejected() {
        let err = Exam::new(
            &blueprint(&[("A", 2), ("B", 1)]),
            Locale::parse("en"),
            vec![section("A", &["a1"]), section("B", &["b1"])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::QuotaExceeded { ref task_id, required: 2, have: 1 } if task_id == "A"
        ));
    }

    #[test]
    fn missing_section_is_rejected() {
        let err = Exam::new(
            &blueprint(&[("A", 1), ("B", 1)]),
            Locale::parse("en"),
            vec![section("A", &["a1"])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::QuotaExceeded { ref task_id, required: 1, have: 0 } if task_id == "B"
        ));
    }

    #[test]
    fn misordered_or_oversized_sections_are_rejected() {
        let bp = blueprint(&[("A", 1), ("B", 1)]);
        let swapped = Exam::new(
            &bp,
            Locale::parse("en"),
            vec![section("B", &["b1"]), section("A", &["a1"])],
        )
        .unwrap_err();
        assert!(swapped.to_string().contains("bp/sections[0]"));

        let surplus = Exam::new(
            &bp,
            Locale::parse("en"),
            vec![section("A", &["a1", "a2"]), section("B", &["b1"])],
        )
        .unwrap_err();
        assert!(matches!(surplus, AssemblyError::SchemaViolation { .. }));

        let extra = Exam::new(
            &bp,
            Locale::parse("en"),
            vec![section("A", &["a1"]), section("B", &["b1"]), section("C", &["c1"])],
        )
        .unwrap_err();
        assert!(extra.to_string().contains("bp/sections[2]"));
    }
}
