//! In-memory message-unit repository.
//!
//! Transactions buffer their writes and apply them at commit under a single
//! write lock, after checking that every saved unit still has the version
//! the transaction read. Message ids of outgoing units are unique; the check
//! is repeated at commit so interleaved submissions cannot both succeed.
//! A fault switch makes the repository report itself
//! unavailable, to exercise failure handling.

use crate::domain::{MessageUnit, UnitKey, UnitRef};
use crate::error::{RepositoryError, RepositoryResult};
use crate::ports::outbound::{MessageUnitRepository, RepositoryTransaction, UnitFilter};
use parking_lot::RwLock;
use shared_types::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Tables {
    units: HashMap<UnitKey, MessageUnit>,
    /// Insertion order, used to keep query results stable
    order: Vec<UnitKey>,
}

#[derive(Default)]
pub struct InMemoryMessageUnitRepository {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryMessageUnitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, `begin` and `commit` fail with `RepositoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.tables.read().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory repository switched off".into(),
            ));
        }
        Ok(())
    }

    fn stored_version(&self, key: UnitKey) -> Option<u64> {
        self.tables.read().units.get(&key).map(|u| u.version)
    }
}

impl MessageUnitRepository for InMemoryMessageUnitRepository {
    fn begin(&self) -> RepositoryResult<Box<dyn RepositoryTransaction + '_>> {
        self.check_available()?;
        Ok(Box::new(MemoryTransaction {
            repository: self,
            pending: Vec::new(),
        }))
    }
}

enum PendingWrite {
    Insert(MessageUnit),
    Update { unit: MessageUnit, expected: u64 },
}

impl PendingWrite {
    fn unit(&self) -> &MessageUnit {
        match self {
            PendingWrite::Insert(unit) | PendingWrite::Update { unit, .. } => unit,
        }
    }
}

struct MemoryTransaction<'a> {
    repository: &'a InMemoryMessageUnitRepository,
    pending: Vec<PendingWrite>,
}

impl MemoryTransaction<'_> {
    fn pending_unit(&self, key: UnitKey) -> Option<&MessageUnit> {
        self.pending
            .iter()
            .rev()
            .map(PendingWrite::unit)
            .find(|u| u.key == key)
    }

    /// Version as seen by this transaction.
    fn visible_version(&self, key: UnitKey) -> Option<u64> {
        self.pending_unit(key)
            .map(|u| u.version)
            .or_else(|| self.repository.stored_version(key))
    }
}

impl RepositoryTransaction for MemoryTransaction<'_> {
    fn load(&mut self, key: UnitKey) -> RepositoryResult<Option<MessageUnit>> {
        if let Some(unit) = self.pending_unit(key) {
            return Ok(Some(unit.clone()));
        }
        Ok(self.repository.tables.read().units.get(&key).cloned())
    }

    fn find(&mut self, filter: &UnitFilter) -> RepositoryResult<Vec<MessageUnit>> {
        let tables = self.repository.tables.read();
        let mut found: Vec<MessageUnit> = tables
            .order
            .iter()
            .filter_map(|key| tables.units.get(key))
            .map(|stored| self.pending_unit(stored.key).unwrap_or(stored).clone())
            .filter(|unit| filter.matches(unit))
            .collect();
        drop(tables);

        let inserted: Vec<MessageUnit> = self
            .pending
            .iter()
            .filter_map(|write| match write {
                PendingWrite::Insert(unit) => self.pending_unit(unit.key).cloned(),
                PendingWrite::Update { .. } => None,
            })
            .filter(|unit| filter.matches(unit))
            .collect();
        found.extend(inserted);
        found.sort_by_key(|u| u.timestamp);
        Ok(found)
    }

    fn insert(&mut self, mut unit: MessageUnit) -> RepositoryResult<UnitRef> {
        if self.visible_version(unit.key).is_some() {
            return Err(RepositoryError::Backend(format!(
                "message unit {} already stored",
                unit.key
            )));
        }
        unit.version = 1;
        let unit_ref = unit.unit_ref();
        self.pending.push(PendingWrite::Insert(unit));
        Ok(unit_ref)
    }

    fn save(&mut self, mut unit: MessageUnit, expected_version: u64) -> RepositoryResult<UnitRef> {
        let actual = self
            .visible_version(unit.key)
            .ok_or(RepositoryError::NotFound(unit.key))?;
        if actual != expected_version {
            return Err(RepositoryError::VersionConflict {
                key: unit.key,
                expected: expected_version,
                actual,
            });
        }
        unit.version = expected_version + 1;
        let unit_ref = unit.unit_ref();
        self.pending.push(PendingWrite::Update {
            unit,
            expected: expected_version,
        });
        Ok(unit_ref)
    }

    fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let repository = self.repository;
        repository.check_available()?;
        let mut tables = repository.tables.write();

        // Replay the versions this transaction expects against the stored ones
        let mut versions: HashMap<UnitKey, u64> = HashMap::new();
        let mut outgoing_ids: HashSet<&str> = HashSet::new();
        for write in &self.pending {
            match write {
                PendingWrite::Insert(unit) => {
                    if tables.units.contains_key(&unit.key) || versions.contains_key(&unit.key) {
                        return Err(RepositoryError::Backend(format!(
                            "message unit {} already stored",
                            unit.key
                        )));
                    }
                    if unit.direction == Direction::Out {
                        let taken = !outgoing_ids.insert(unit.message_id.as_str())
                            || tables.units.values().any(|stored| {
                                stored.direction == Direction::Out
                                    && stored.message_id == unit.message_id
                            });
                        if taken {
                            return Err(RepositoryError::DuplicateMessageId(
                                unit.message_id.clone(),
                            ));
                        }
                    }
                    versions.insert(unit.key, unit.version);
                }
                PendingWrite::Update { unit, expected } => {
                    let actual = versions
                        .get(&unit.key)
                        .copied()
                        .or_else(|| tables.units.get(&unit.key).map(|u| u.version))
                        .ok_or(RepositoryError::NotFound(unit.key))?;
                    if actual != *expected {
                        return Err(RepositoryError::VersionConflict {
                            key: unit.key,
                            expected: *expected,
                            actual,
                        });
                    }
                    versions.insert(unit.key, unit.version);
                }
            }
        }

        for write in self.pending {
            match write {
                PendingWrite::Insert(unit) => {
                    tables.order.push(unit.key);
                    tables.units.insert(unit.key, unit);
                }
                PendingWrite::Update { unit, .. } => {
                    tables.units.insert(unit.key, unit);
                }
            }
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageUnitKind, ProcessingState, ProcessingStateLedger};
    use shared_types::Direction;

    fn unit(message_id: &str, timestamp: u64) -> MessageUnit {
        let mut states = ProcessingStateLedger::new();
        states.append(ProcessingState::Received, timestamp, None);
        MessageUnit {
            key: UnitKey::new(),
            version: 0,
            kind: MessageUnitKind::UserMessage,
            direction: Direction::In,
            message_id: message_id.into(),
            ref_to_message_id: None,
            timestamp,
            pmode_id: None,
            mpc: None,
            states,
        }
    }

    fn stored(repo: &InMemoryMessageUnitRepository, unit: MessageUnit) -> UnitRef {
        let mut tx = repo.begin().unwrap();
        let unit_ref = tx.insert(unit).unwrap();
        tx.commit().unwrap();
        unit_ref
    }

    #[test]
    fn test_insert_starts_at_version_one() {
        let repo = InMemoryMessageUnitRepository::new();
        let unit_ref = stored(&repo, unit("m1", 1));
        assert_eq!(unit_ref.version, 1);

        let mut tx = repo.begin().unwrap();
        let loaded = tx.load(unit_ref.key).unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.message_id, "m1");
    }

    #[test]
    fn test_writes_invisible_until_commit() {
        let repo = InMemoryMessageUnitRepository::new();
        let mut tx = repo.begin().unwrap();
        let unit_ref = tx.insert(unit("m1", 1)).unwrap();
        assert!(tx.load(unit_ref.key).unwrap().is_some());
        assert!(repo.is_empty());

        tx.rollback();
        assert!(repo.is_empty());
    }

    #[test]
    fn test_stale_save_conflicts_at_commit() {
        let repo = InMemoryMessageUnitRepository::new();
        let unit_ref = stored(&repo, unit("m1", 1));

        let mut first = repo.begin().unwrap();
        let mut second = repo.begin().unwrap();
        let a = first.load(unit_ref.key).unwrap().unwrap();
        let b = second.load(unit_ref.key).unwrap().unwrap();

        first.save(a, 1).unwrap();
        second.save(b, 1).unwrap();
        first.commit().unwrap();

        let err = second.commit().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            err,
            RepositoryError::VersionConflict {
                key: unit_ref.key,
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_save_with_wrong_version_fails_early() {
        let repo = InMemoryMessageUnitRepository::new();
        let unit_ref = stored(&repo, unit("m1", 1));

        let mut tx = repo.begin().unwrap();
        let loaded = tx.load(unit_ref.key).unwrap().unwrap();
        assert!(tx.save(loaded, 7).unwrap_err().is_conflict());
    }

    #[test]
    fn test_find_filters_and_orders_by_timestamp() {
        let repo = InMemoryMessageUnitRepository::new();
        stored(&repo, unit("late", 20));
        stored(&repo, unit("early", 10));
        let mut outgoing = unit("out", 5);
        outgoing.direction = Direction::Out;
        stored(&repo, outgoing);

        let mut tx = repo.begin().unwrap();
        let found = tx
            .find(&UnitFilter::new().direction(Direction::In))
            .unwrap();
        let ids: Vec<_> = found.iter().map(|u| u.message_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);

        let pending = tx.insert(unit("pending", 15)).unwrap();
        let found = tx
            .find(&UnitFilter::new().states(&[ProcessingState::Received]).direction(Direction::In))
            .unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[1].key, pending.key);
    }

    #[test]
    fn test_interleaved_outgoing_inserts_keep_message_id_unique() {
        let repo = InMemoryMessageUnitRepository::new();
        let by_id = UnitFilter::new().direction(Direction::Out).message_id("m1");
        let outgoing = || {
            let mut u = unit("m1", 1);
            u.direction = Direction::Out;
            u
        };

        let mut first = repo.begin().unwrap();
        let mut second = repo.begin().unwrap();
        assert!(first.find(&by_id).unwrap().is_empty());
        assert!(second.find(&by_id).unwrap().is_empty());
        first.insert(outgoing()).unwrap();
        second.insert(outgoing()).unwrap();

        first.commit().unwrap();
        assert_eq!(
            second.commit(),
            Err(RepositoryError::DuplicateMessageId("m1".into()))
        );

        let mut tx = repo.begin().unwrap();
        assert_eq!(tx.find(&by_id).unwrap().len(), 1);

        // A received unit with the same id does not count
        stored(&repo, unit("m1", 2));
        let mut tx = repo.begin().unwrap();
        tx.insert(outgoing()).unwrap();
        assert!(matches!(
            tx.commit(),
            Err(RepositoryError::DuplicateMessageId(_))
        ));
        assert_eq!(repo.len(), 2);

        let mut twice = repo.begin().unwrap();
        for _ in 0..2 {
            let mut u = outgoing();
            u.message_id = "m2".into();
            twice.insert(u).unwrap();
        }
        assert_eq!(
            twice.commit(),
            Err(RepositoryError::DuplicateMessageId("m2".into()))
        );
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_fault_switch() {
        let repo = InMemoryMessageUnitRepository::new();
        let mut tx = repo.begin().unwrap();
        tx.insert(unit("m1", 1)).unwrap();

        repo.set_unavailable(true);
        assert!(matches!(tx.commit(), Err(RepositoryError::Unavailable(_))));
        assert!(matches!(repo.begin(), Err(RepositoryError::Unavailable(_))));

        repo.set_unavailable(false);
        assert!(repo.begin().is_ok());
        assert!(repo.is_empty());
    }
}
