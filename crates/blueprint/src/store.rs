//! Memoizing blueprint store.
//!
//! Each blueprint id owns a slot holding a `tokio::sync::OnceCell`. The
//! first caller for an id claims the slot and decodes; concurrent callers
//! for the same id wait on the cell instead of decoding again, while other
//! ids decode in parallel. A failed decode leaves the cell empty, so the
//! next access retries; the empty slot is dropped once no caller holds it.

use examforge_core::{AssemblyError, Blueprint, BlueprintId, BlueprintSource, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type Slot = Arc<OnceCell<Arc<Blueprint>>>;

pub struct BlueprintStore {
    source: Arc<dyn BlueprintSource>,
    slots: Mutex<HashMap<BlueprintId, Slot>>,
}

impl BlueprintStore {
    pub fn new(source: Arc<dyn BlueprintSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Return the blueprint for `id`, decoding it on first access.
    pub async fn load(&self, id: &BlueprintId) -> Result<Arc<Blueprint>> {
        let slot = self.slot(id);
        if let Some(blueprint) = slot.get() {
            debug!(blueprint_id = %id, "Blueprint cache hit");
            return Ok(Arc::clone(blueprint));
        }

        match slot.get_or_try_init(|| self.decode(id)).await {
            Ok(blueprint) => Ok(Arc::clone(blueprint)),
            Err(e) => {
                warn!(blueprint_id = %id, kind = e.kind(), error = %e, "Blueprint decode failed");
                self.release(id, &slot);
                Err(e)
            }
        }
    }

    /// Ids whose blueprints are decoded and cached, sorted.
    pub fn cached_ids(&self) -> Vec<BlueprintId> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<BlueprintId> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &BlueprintId) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(id.clone()).or_default())
    }

    /// Forget an empty slot nobody else is waiting on, so ids that fail
    /// to decode do not accumulate.
    fn release(&self, id: &BlueprintId, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        // one reference in the map, one held by the caller
        let idle = slots.get(id).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) == 2
        });
        if idle {
            slots.remove(id);
        }
    }

    async fn decode(&self, id: &BlueprintId) -> Result<Arc<Blueprint>> {
        let started = Instant::now();
        let blueprint = self.source.decode(id).await?;
        if blueprint.id() != id {
            return Err(AssemblyError::schema(
                id.as_str(),
                format!("source {} returned blueprint {}", self.source.name(), blueprint.id()),
            ));
        }
        info!(
            blueprint_id = %id,
            source = self.source.name(),
            tasks = blueprint.task_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Blueprint decoded"
        );
        Ok(Arc::new(blueprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use examforge_core::TaskSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps while decoding and counts calls per id.
    #[derive(Default)]
    struct CountingSource {
        calls: Mutex<HashMap<String, usize>>,
        fail_first: bool,
        attempts: AtomicUsize,
    }

    impl CountingSource {
        fn calls(&self, id: &str) -> usize {
            self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl BlueprintSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn decode(&self, id: &BlueprintId) -> Result<Blueprint> {
            *self.calls.lock().unwrap().entry(id.to_string()).or_default() += 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail_first && self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AssemblyError::schema(id.as_str(), "truncated document"));
            }
            Blueprint::new(id.clone(), vec![TaskSpec::new("A", 1)])
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_decodes_once() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(BlueprintStore::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.load(&"bp".into()).await })
            })
            .collect();

        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(source.calls("bp"), 1);
        assert!(loaded.iter().all(|bp| Arc::ptr_eq(bp, &loaded[0])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unrelated_ids_decode_independently() {
        let source = Arc::new(CountingSource::default());
        let store = BlueprintStore::new(source.clone());

        let (a_id, b_id): (BlueprintId, BlueprintId) = ("a".into(), "b".into());
        let (a, b) = tokio::join!(store.load(&a_id), store.load(&b_id));
        assert_eq!(a.unwrap().id().as_str(), "a");
        assert_eq!(b.unwrap().id().as_str(), "b");
        assert_eq!(source.calls("a"), 1);
        assert_eq!(source.calls("b"), 1);
        assert_eq!(store.cached_ids(), vec![BlueprintId::from("a"), BlueprintId::from("b")]);
    }

    #[tokio::test]
    async fn repeated_loads_hit_cache() {
        let source = Arc::new(CountingSource::default());
        let store = BlueprintStore::new(source.clone());

        let first = store.load(&"bp".into()).await.unwrap();
        let second = store.load(&"bp".into()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.calls("bp"), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn failed_decode_is_not_cached() {
        let source = Arc::new(CountingSource {
            fail_first: true,
            ..Default::default()
        });
        let store = BlueprintStore::new(source.clone());

        let err = store.load(&"bp".into()).await.unwrap_err();
        assert!(matches!(err, AssemblyError::SchemaViolation { .. }));
        assert!(store.is_empty());

        let bp = store.load(&"bp".into()).await.unwrap();
        assert_eq!(bp.task_count(), 1);
        assert_eq!(source.calls("bp"), 2);
    }

    /// Every id is missing.
    struct EmptySource;

    #[async_trait]
    impl BlueprintSource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }

        async fn decode(&self, id: &BlueprintId) -> Result<Blueprint> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(AssemblyError::not_found(format!("{id}.json")))
        }
    }

    fn slot_count(store: &BlueprintStore) -> usize {
        store.slots.lock().unwrap().len()
    }

    #[tokio::test]
    async fn failed_ids_do_not_accumulate_slots() {
        let store = BlueprintStore::new(Arc::new(EmptySource));
        for n in 0..100 {
            let id = BlueprintId::new(format!("missing-{n}"));
            let err = store.load(&id).await.unwrap_err();
            assert!(matches!(err, AssemblyError::ContentNotFound { .. }));
        }
        assert_eq!(slot_count(&store), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_failures_release_the_shared_slot() {
        let store = BlueprintStore::new(Arc::new(EmptySource));
        let id = BlueprintId::from("missing");
        let (a, b, c) = tokio::join!(store.load(&id), store.load(&id), store.load(&id));
        assert!(a.is_err() && b.is_err() && c.is_err());
        assert_eq!(slot_count(&store), 0);
    }

    #[tokio::test]
    async fn retried_slot_is_kept_once_decoded() {
        let source = Arc::new(CountingSource {
            fail_first: true,
            ..Default::default()
        });
        let store = BlueprintStore::new(source.clone());
        let id = BlueprintId::from("bp");

        store.load(&id).await.unwrap_err();
        assert_eq!(slot_count(&store), 0);
        store.load(&id).await.unwrap();
        assert_eq!(slot_count(&store), 1);
    }

    struct MislabelledSource;

    #[async_trait]
    impl BlueprintSource for MislabelledSource {
        fn name(&self) -> &str {
            "mislabelled"
        }

        async fn decode(&self, _id: &BlueprintId) -> Result<Blueprint> {
            Blueprint::new("someone-else".into(), vec![])
        }
    }

    #[tokio::test]
    async fn rejects_blueprint_with_foreign_id() {
        let store = BlueprintStore::new(Arc::new(MislabelledSource));
        let err = store.load(&"bp".into()).await.unwrap_err();
        assert!(err.to_string().contains("someone-else"));
        assert!(store.cached_ids().is_empty());
    }
}
