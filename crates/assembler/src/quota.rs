//! Quota distribution for practice scopes.
//!
//! A practice session picks a subset of blueprint tasks and a total item
//! count; the blueprint quotas of the chosen tasks are scaled to that total
//! with the largest-remainder method. Arithmetic is integral, so the result
//! is exact and deterministic.

use examforge_core::{AssemblyError, Blueprint, BlueprintId, Result, TaskSpec};
use std::collections::{HashMap, HashSet};

pub struct QuotaDistributor;

struct Entry<'a> {
    task_id: &'a str,
    weight: usize,
    order: usize,
}

impl QuotaDistributor {
    /// Scale the quotas of `chosen` tasks to `total`.
    ///
    /// Weights come from `blueprint_quotas` (missing ⇒ 0). If every weight is
    /// zero the total is split evenly. Tasks allocated zero are omitted; the
    /// result keeps `chosen` order.
    pub fn proportional(
        blueprint_quotas: &HashMap<String, usize>,
        chosen: &[String],
        total: usize,
    ) -> Vec<(String, usize)> {
        if total == 0 || chosen.is_empty() {
            return Vec::new();
        }
        let entries: Vec<Entry<'_>> = unique(chosen)
            .enumerate()
            .map(|(order, task_id)| Entry {
                task_id,
                weight: blueprint_quotas.get(task_id).copied().unwrap_or(0),
                order,
            })
            .collect();
        if entries.iter().all(|e| e.weight == 0) {
            return Self::even(chosen, total);
        }
        distribute(&entries, total)
    }

    /// Split `total` evenly across `chosen`, earlier tasks taking the remainder.
    pub fn even(chosen: &[String], total: usize) -> Vec<(String, usize)> {
        if total == 0 || chosen.is_empty() {
            return Vec::new();
        }
        let entries: Vec<Entry<'_>> = unique(chosen)
            .enumerate()
            .map(|(order, task_id)| Entry {
                task_id,
                weight: 1,
                order,
            })
            .collect();
        distribute(&entries, total)
    }
}

fn unique(chosen: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    chosen
        .iter()
        .map(String::as_str)
        .filter(move |id| seen.insert(*id))
}

fn distribute(entries: &[Entry<'_>], total: usize) -> Vec<(String, usize)> {
    // u128 holds any usize product, so scaling never overflows.
    let weight_sum: u128 = entries.iter().map(|e| e.weight as u128).sum();
    if weight_sum == 0 {
        return Vec::new();
    }

    // base = floor(total * w / sum); remainders share the denominator `sum`.
    let mut allocations: Vec<usize> = Vec::with_capacity(entries.len());
    let mut remainders: Vec<(usize, u128)> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let scaled = total as u128 * entry.weight as u128;
        // quotient <= total, so it fits back in usize
        allocations.push((scaled / weight_sum) as usize);
        remainders.push((index, scaled % weight_sum));
    }

    let allocated: usize = allocations.iter().sum();
    let mut remaining = total - allocated;
    remainders.sort_by(|(ia, ra), (ib, rb)| {
        rb.cmp(ra)
            .then_with(|| entries[*ib].weight.cmp(&entries[*ia].weight))
            .then_with(|| entries[*ia].order.cmp(&entries[*ib].order))
    });
    let mut cursor = 0;
    while remaining > 0 {
        let (index, _) = remainders[cursor % remainders.len()];
        allocations[index] += 1;
        remaining -= 1;
        cursor += 1;
    }

    entries
        .iter()
        .zip(allocations)
        .filter(|(_, count)| *count > 0)
        .map(|(entry, count)| (entry.task_id.to_string(), count))
        .collect()
}

/// Derive a practice blueprint covering only `chosen` tasks with `total` items.
///
/// Task order, locale policy, and de-duplication settings are inherited from
/// `blueprint`. The derived id is the original id suffixed with `#practice`.
pub fn practice_scope(blueprint: &Blueprint, chosen: &[String], total: usize) -> Result<Blueprint> {
    let scoped_id = BlueprintId::new(format!("{}#practice", blueprint.id()));
    if let Some(unknown) = chosen.iter().find(|id| blueprint.task(id).is_none()) {
        return Err(AssemblyError::schema(
            scoped_id.as_str(),
            format!("unknown task id {unknown} in practice scope"),
        ));
    }

    let quotas: HashMap<String, usize> = blueprint
        .tasks()
        .iter()
        .map(|t| (t.task_id.clone(), t.need))
        .collect();
    let allocation: HashMap<String, usize> =
        QuotaDistributor::proportional(&quotas, chosen, total)
            .into_iter()
            .collect();

    let tasks: Vec<TaskSpec> = blueprint
        .tasks()
        .iter()
        .filter_map(|task| {
            allocation.get(&task.task_id).map(|need| TaskSpec {
                need: *need,
                ..task.clone()
            })
        })
        .collect();

    tracing::debug!(
        blueprint_id = %blueprint.id(),
        chosen = chosen.len(),
        total,
        tasks = tasks.len(),
        "Practice scope derived"
    );
    Blueprint::new(scoped_id, tasks)
}
