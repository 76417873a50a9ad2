//! Candidate prioritization and family de-duplication.
//!
//! # Order
//!
//! Candidates are ranked by a total order, so ranking is deterministic:
//!
//! 1. Requested-locale items before reference-locale (fallback) items
//! 2. Never-attempted items first
//! 3. Lower `correct / attempts` ratio first (compared exactly, without floats)
//! 4. Older `last_seen_at` first; a seen item with no timestamp counts as oldest
//! 5. Item id ascending
//!
//! De-duplication walks the ranked list and keeps the first member of each
//! family, so a family's representative is its best-ranked member.

use examforge_core::{ItemStats, Question};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A candidate item together with the locale tier it was gathered from.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub question: Question,
    /// Gathered from the reference locale rather than the requested one
    pub fallback: bool,
}

/// The eligible, ranked candidates for one task.
#[derive(Debug, Clone, Default)]
pub struct RankedSet {
    pub candidates: Vec<Candidate>,
    /// Some family had more than one candidate
    pub family_duplicates: bool,
}

impl RankedSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Rank `candidates` and, when `dedupe_by_family` is set, keep one item per family.
///
/// Items repeated under the same id are collapsed to their best-ranked copy.
pub fn rank(
    mut candidates: Vec<Candidate>,
    stats: &HashMap<String, ItemStats>,
    dedupe_by_family: bool,
) -> RankedSet {
    candidates.sort_by(|a, b| compare(a, b, stats));

    let mut seen_ids: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut seen_families: HashSet<String> = HashSet::new();
    let mut family_duplicates = false;
    let mut kept = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if !seen_ids.insert(candidate.question.id.clone()) {
            continue;
        }
        if dedupe_by_family {
            if let Some(family) = candidate.question.family() {
                if !seen_families.insert(family.to_string()) {
                    family_duplicates = true;
                    continue;
                }
            }
        }
        kept.push(candidate);
    }

    RankedSet {
        candidates: kept,
        family_duplicates,
    }
}

/// Number of eligible items `questions` would yield after de-duplication.
///
/// Used to decide whether a fallback query is needed before history is
/// fetched; the count does not depend on ranking.
pub fn eligible_count(questions: &[Question], dedupe_by_family: bool) -> usize {
    let mut ids = HashSet::new();
    let mut families = HashSet::new();
    questions
        .iter()
        .filter(|q| ids.insert(q.id.as_str()))
        .filter(|q| match (dedupe_by_family, q.family()) {
            (true, Some(family)) => families.insert(family),
            _ => true,
        })
        .count()
}

fn compare(a: &Candidate, b: &Candidate, stats: &HashMap<String, ItemStats>) -> Ordering {
    let unseen = ItemStats::default();
    let sa = stats.get(&a.question.id).unwrap_or(&unseen);
    let sb = stats.get(&b.question.id).unwrap_or(&unseen);

    a.fallback
        .cmp(&b.fallback)
        .then_with(|| sb.is_unseen().cmp(&sa.is_unseen()))
        .then_with(|| compare_accuracy(sa, sb))
        .then_with(|| sa.last_seen_at.cmp(&sb.last_seen_at))
        .then_with(|| a.question.id.cmp(&b.question.id))
}

/// Lower accuracy first. Unseen items compare equal to each other.
fn compare_accuracy(a: &ItemStats, b: &ItemStats) -> Ordering {
    if a.is_unseen() || b.is_unseen() {
        return Ordering::Equal;
    }
    let left = u64::from(a.correct) * u64::from(b.attempts);
    let right = u64::from(b.correct) * u64::from(a.attempts);
    left.cmp(&right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candidate(id: &str, family: Option<&str>) -> Candidate {
        let mut question = Question::new(id, "A", "ru");
        question.family_id = family.map(str::to_string);
        Candidate {
            question,
            fallback: false,
        }
    }

    fn ids(set: &RankedSet) -> Vec<&str> {
        set.candidates.iter().map(|c| c.question.id.as_str()).collect()
    }

    #[test]
    fn unseen_items_rank_first() {
        let stats = HashMap::from([("1".to_string(), ItemStats::new(1, 1, None))]);
        let ranked = rank(
            vec![candidate("1", None), candidate("2", None), candidate("3", None)],
            &stats,
            true,
        );
        assert_eq!(ids(&ranked), vec!["2", "3", "1"]);
    }

    #[test]
    fn lower_accuracy_ranks_higher() {
        let stats = HashMap::from([
            ("a".to_string(), ItemStats::new(4, 3, None)),
            ("b".to_string(), ItemStats::new(3, 1, None)),
            ("c".to_string(), ItemStats::new(2, 1, None)),
        ]);
        let ranked = rank(
            vec![candidate("a", None), candidate("b", None), candidate("c", None)],
            &stats,
            false,
        );
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn accuracy_ties_break_by_oldest_then_id() {
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let stats = HashMap::from([
            ("x".to_string(), ItemStats::new(2, 1, Some(new))),
            ("y".to_string(), ItemStats::new(4, 2, Some(old))),
            ("z".to_string(), ItemStats::new(2, 1, Some(new))),
            ("w".to_string(), ItemStats::new(2, 1, None)),
        ]);
        let ranked = rank(
            vec![
                candidate("z", None),
                candidate("x", None),
                candidate("y", None),
                candidate("w", None),
            ],
            &stats,
            false,
        );
        assert_eq!(ids(&ranked), vec!["w", "y", "x", "z"]);
    }

    #[test]
    fn family_representative_is_best_ranked_member() {
        let stats = HashMap::from([("1".to_string(), ItemStats::new(1, 1, None))]);
        let ranked = rank(
            vec![
                candidate("1", Some("F1")),
                candidate("2", Some("F1")),
                candidate("3", Some("F2")),
            ],
            &stats,
            true,
        );
        assert_eq!(ids(&ranked), vec!["2", "3"]);
        assert!(ranked.family_duplicates);
    }

    #[test]
    fn dedupe_disabled_keeps_family_members() {
        let ranked = rank(
            vec![candidate("1", Some("F1")), candidate("2", Some("F1"))],
            &HashMap::new(),
            false,
        );
        assert_eq!(ranked.len(), 2);
        assert!(!ranked.family_duplicates);
    }

    #[test]
    fn requested_locale_outranks_fallback() {
        let stats = HashMap::from([("local".to_string(), ItemStats::new(5, 5, None))]);
        let mut fallback = candidate("fresh-en", None);
        fallback.fallback = true;
        let ranked = rank(vec![fallback, candidate("local", None)], &stats, true);
        assert_eq!(ids(&ranked), vec!["local", "fresh-en"]);
    }

    #[test]
    fn repeated_ids_collapse() {
        let ranked = rank(
            vec![candidate("1", None), candidate("1", None)],
            &HashMap::new(),
            false,
        );
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn eligible_count_respects_families() {
        let questions = vec![
            Question::new("1", "A", "ru").with_family("F1"),
            Question::new("2", "A", "ru").with_family("F1"),
            Question::new("3", "A", "ru"),
            Question::new("3", "A", "ru"),
        ];
        assert_eq!(eligible_count(&questions, true), 2);
        assert_eq!(eligible_count(&questions, false), 3);
    }
}
