//! In-memory P-Mode set.
//!
//! The entries live in a copy-on-write vector behind a `RwLock`. Writers
//! build a new vector and swap it in; readers only clone the `Arc` of the
//! current one, so a snapshot handed out never changes underneath them.

use crate::domain::pmode::ProcessingMode;
use crate::error::{PModeStoreError, PModeStoreResult};
use crate::ports::outbound::PModeSet;
use parking_lot::RwLock;
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type Snapshot = Arc<Vec<Arc<ProcessingMode>>>;

pub struct InMemoryPModeSet {
    entries: RwLock<Snapshot>,
    time_source: Arc<dyn TimeSource>,
    id_counter: AtomicU64,
}

impl InMemoryPModeSet {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            time_source,
            id_counter: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.entries.read().clone()
    }

    fn next_id(&self) -> String {
        let n = self.id_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.time_source.now(), n)
    }
}

impl Default for InMemoryPModeSet {
    fn default() -> Self {
        Self::new()
    }
}

fn position(entries: &[Arc<ProcessingMode>], id: &str) -> Option<usize> {
    entries.iter().position(|p| p.id == id)
}

impl PModeSet for InMemoryPModeSet {
    fn add(&self, mut pmode: ProcessingMode) -> PModeStoreResult<String> {
        let mut entries = self.entries.write();

        if pmode.has_id() {
            if position(&entries, &pmode.id).is_some() {
                return Err(PModeStoreError::DuplicateId(pmode.id));
            }
        } else {
            let mut id = self.next_id();
            while position(&entries, &id).is_some() {
                id = self.next_id();
            }
            debug!(pmode_id = %id, "Generated P-Mode id");
            pmode.id = id;
        }

        let id = pmode.id.clone();
        let mut next = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().cloned());
        next.push(Arc::new(pmode));
        *entries = Arc::new(next);
        Ok(id)
    }

    fn replace(&self, pmode: ProcessingMode) -> PModeStoreResult<()> {
        let mut entries = self.entries.write();
        let index = position(&entries, &pmode.id)
            .ok_or_else(|| PModeStoreError::NotFound(pmode.id.clone()))?;

        let mut next: Vec<_> = entries.iter().cloned().collect();
        next[index] = Arc::new(pmode);
        *entries = Arc::new(next);
        Ok(())
    }

    fn remove(&self, id: &str) -> PModeStoreResult<()> {
        let mut entries = self.entries.write();
        let index = position(&entries, id).ok_or_else(|| PModeStoreError::NotFound(id.to_string()))?;

        let mut next: Vec<_> = entries.iter().cloned().collect();
        next.remove(index);
        *entries = Arc::new(next);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<Arc<ProcessingMode>> {
        let entries = self.snapshot();
        entries.iter().find(|p| p.id == id).cloned()
    }

    fn get_all(&self) -> Vec<Arc<ProcessingMode>> {
        (*self.snapshot()).clone()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ManualTimeSource;

    fn named(id: &str) -> ProcessingMode {
        ProcessingMode {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let store = InMemoryPModeSet::new();
        assert_eq!(store.add(named("a")).unwrap(), "a");
        assert!(store.contains_id("a"));
        assert_eq!(store.get("a").unwrap().id, "a");
        assert!(store.get("b").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected_and_store_unchanged() {
        let store = InMemoryPModeSet::new();
        store.add(named("a")).unwrap();

        let mut other = named("a");
        other.mep = "twoWay".into();
        assert_eq!(
            store.add(other),
            Err(PModeStoreError::DuplicateId("a".into()))
        );
        assert_eq!(store.len(), 1);
        assert!(store.get("a").unwrap().mep.is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let store = InMemoryPModeSet::with_time_source(clock);

        // Occupy the id the generator produces first
        store.add(named("1000-0")).unwrap();
        let first = store.add(ProcessingMode::default()).unwrap();
        let second = store.add(ProcessingMode::default()).unwrap();

        assert_eq!(first, "1000-1");
        assert_eq!(second, "1000-2");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_replace_keeps_position() {
        let store = InMemoryPModeSet::new();
        for id in ["a", "b", "c"] {
            store.add(named(id)).unwrap();
        }
        let mut b = named("b");
        b.mep = "oneWay".into();
        store.replace(b).unwrap();

        let ids: Vec<_> = store.get_all().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.get("b").unwrap().mep, "oneWay");

        assert_eq!(
            store.replace(named("x")),
            Err(PModeStoreError::NotFound("x".into()))
        );
    }

    #[test]
    fn test_remove() {
        let store = InMemoryPModeSet::new();
        store.add(named("a")).unwrap();
        store.remove("a").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.remove("a"), Err(PModeStoreError::NotFound("a".into())));
    }

    #[test]
    fn test_snapshot_is_stable() {
        let store = InMemoryPModeSet::new();
        store.add(named("a")).unwrap();
        let snapshot = store.get_all();

        store.add(named("b")).unwrap();
        store.remove("a").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "a");
    }
}
