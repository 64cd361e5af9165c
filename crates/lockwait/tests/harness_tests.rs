//! Integration tests for the deadlock harness.

use std::time::Duration;

use lockwait::harness::{
    Actor, ActorOutcome, DeadlockHarness, EventKind, HarnessConfig, HarnessError, RunReport,
    Target,
};
use lockwait::{fixtures, Config, Database, LockConfig, StorageEngine, VictimPolicy};
use lockwait_storage::backends::{CommittedStore, MemoryStore, WriteOp};
use lockwait_storage::{LockKey, LockManager, StorageResult, Transaction, TxnId};

fn quick() -> HarnessConfig {
    HarnessConfig::new()
        .lock_timeout(Duration::from_secs(2))
        .gate_timeout(Duration::from_secs(2))
        .run_timeout(Duration::from_secs(10))
}

fn seeded_harness<E: StorageEngine + 'static>(
    db: Database<E>,
    config: HarnessConfig,
) -> DeadlockHarness<E> {
    fixtures::seed(&db).expect("failed to seed");
    DeadlockHarness::new(db, config)
}

/// Exactly one actor aborted by deadlock detection, the other committed.
fn assert_single_deadlock_victim(report: &RunReport) {
    let victims = report.victims();
    assert_eq!(victims.len(), 1, "expected one victim: {report:?}");

    let survivor = match victims[0] {
        Actor::Alice => Actor::Bob,
        Actor::Bob => Actor::Alice,
    };
    assert!(matches!(report.outcome(victims[0]), ActorOutcome::Deadlocked(_)));
    assert_eq!(report.outcome(survivor), &ActorOutcome::Committed);
    assert_eq!(report.locks.deadlocks, 1);
}

fn position(report: &RunReport, actor: Actor, kind: &EventKind) -> Option<u64> {
    report.events.iter().find(|e| e.actor == actor && &e.kind == kind).map(|e| e.seq)
}

// ============================================================================
// Backends
// ============================================================================

#[test]
fn test_memory_backend_deadlock() {
    let db = Database::in_memory();
    let harness = seeded_harness(db.clone(), quick());

    let report = harness.run().expect("harness run failed");
    assert_single_deadlock_victim(&report);
    fixtures::verify_seed(&db).expect("seed rows changed");
}

#[test]
fn test_redb_in_memory_backend_deadlock() {
    let db = Database::redb_in_memory(&Config::new()).expect("failed to create database");
    let harness = seeded_harness(db, quick());

    let report = harness.run().expect("harness run failed");
    assert_single_deadlock_victim(&report);
}

#[test]
fn test_redb_file_backend_deadlock() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("lockwait.redb");

    {
        let db = Database::open_redb(&path, &Config::new()).expect("failed to open database");
        let harness = seeded_harness(db, quick());
        let report = harness.run().expect("harness run failed");
        assert_single_deadlock_victim(&report);
    }

    // The seed rows survive on disk, unchanged by the aborted transaction.
    let db = Database::open_redb(&path, &Config::new()).expect("failed to reopen database");
    fixtures::verify_seed(&db).expect("seed rows changed");
}

// ============================================================================
// Event ordering
// ============================================================================

#[test]
fn test_recorded_ordering() {
    let harness = seeded_harness(Database::in_memory(), quick());
    let report = harness.run().expect("harness run failed");

    let alice_post = position(&report, Actor::Alice, &EventKind::LockAcquired(Target::Post));
    let bob_begin = position(&report, Actor::Bob, &EventKind::TxBegin);
    let bob_comment = position(&report, Actor::Bob, &EventKind::LockAcquired(Target::Comment));
    let gate_opened = position(&report, Actor::Bob, &EventKind::GateOpened);
    let gate_awaited = position(&report, Actor::Alice, &EventKind::GateAwaited);
    let alice_wants = position(&report, Actor::Alice, &EventKind::LockRequested(Target::Comment));

    assert!(alice_post < bob_begin, "Alice must hold the post before Bob starts");
    assert!(bob_comment < gate_opened);
    assert!(gate_opened < gate_awaited);
    assert!(gate_awaited < alice_wants);
    assert!(alice_post.is_some() && alice_wants.is_some());

    let aborted = report.events.iter().filter(|e| matches!(e.kind, EventKind::Aborted(_))).count();
    let committed = report.events.iter().filter(|e| e.kind == EventKind::Committed).count();
    assert_eq!((aborted, committed), (1, 1));

    let seqs: Vec<u64> = report.events.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] + 1 == w[1]));
}

// ============================================================================
// Lock configurations
// ============================================================================

#[test]
fn test_youngest_victim_is_bob() {
    // Bob always begins after Alice holds the post, so his transaction is younger.
    let db = Database::in_memory_with_locks(LockConfig::new().victim(VictimPolicy::Youngest));
    let harness = seeded_harness(db, quick());

    for report in harness.run_many(3).expect("harness run failed") {
        assert_single_deadlock_victim(&report);
        assert_eq!(report.victims(), vec![Actor::Bob]);
        assert_eq!(report.alice, ActorOutcome::Committed);
    }
}

#[test]
fn test_timeout_only_breaks_cycle_by_timeout() {
    let db = Database::in_memory_with_locks(LockConfig::timeout_only(Duration::from_millis(100)));
    let config = quick().lock_timeout(Duration::from_millis(100));
    let harness = seeded_harness(db.clone(), config);

    let report = harness.run().expect("harness run failed");
    assert!(!report.victims().is_empty());
    for actor in report.victims() {
        assert!(matches!(report.outcome(actor), ActorOutcome::TimedOut(_)));
    }
    assert_eq!(report.locks.deadlocks, 0);
    assert!(report.locks.timeouts >= 1);
    fixtures::verify_seed(&db).expect("seed rows changed");
}

#[test]
fn test_run_many_keeps_seed_intact() {
    let db = Database::in_memory();
    let harness = seeded_harness(db.clone(), quick());

    let reports = harness.run_many(5).expect("harness run failed");
    assert_eq!(reports.len(), 5);
    for report in &reports {
        assert_single_deadlock_victim(report);
    }
    assert_eq!(db.lock_stats().deadlocks, 5);
    fixtures::verify_seed(&db).expect("seed rows changed");
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_unseeded_database_is_unexpected() {
    let harness = DeadlockHarness::new(
        Database::in_memory(),
        quick().gate_timeout(Duration::from_millis(200)),
    );

    let err = harness.run().expect_err("run without seed rows must fail");
    assert!(
        matches!(err, HarnessError::Unexpected { actor: Actor::Alice, .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_run_timeout() {
    let db = Database::in_memory_with_locks(LockConfig::timeout_only(Duration::from_secs(2)));
    let config = quick().run_timeout(Duration::from_millis(100));
    let harness = seeded_harness(db, config);

    let err = harness.run().expect_err("run must time out");
    assert!(matches!(err, HarnessError::Timeout(t) if t == Duration::from_millis(100)));
}

/// An engine whose transactions never lock, so nothing ever conflicts.
#[derive(Default)]
struct UnlockedEngine {
    store: MemoryStore,
    locks: LockManager,
}

struct UnlockedTransaction<'a> {
    id: TxnId,
    store: &'a MemoryStore,
    read_only: bool,
}

impl StorageEngine for UnlockedEngine {
    type Transaction<'a> = UnlockedTransaction<'a>;

    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>> {
        Ok(UnlockedTransaction { id: self.locks.begin(), store: &self.store, read_only: true })
    }

    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>> {
        Ok(UnlockedTransaction { id: self.locks.begin(), store: &self.store, read_only: false })
    }

    fn lock_manager(&self) -> &LockManager {
        &self.locks
    }
}

impl Transaction for UnlockedTransaction<'_> {
    fn id(&self) -> TxnId {
        self.id
    }

    fn get(&self, table: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.store.read(table, key)
    }

    fn get_for_update(
        &mut self,
        table: &str,
        key: &[u8],
        _timeout: Option<Duration>,
    ) -> StorageResult<Option<Vec<u8>>> {
        self.get(table, key)
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.store.apply(vec![WriteOp::Put {
            table: table.to_owned(),
            key: key.to_vec(),
            value: value.to_vec(),
        }])
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> StorageResult<bool> {
        let existed = self.get(table, key)?.is_some();
        self.store.apply(vec![WriteOp::Delete { table: table.to_owned(), key: key.to_vec() }])?;
        Ok(existed)
    }

    fn commit(self) -> StorageResult<()> {
        Ok(())
    }

    fn rollback(self) -> StorageResult<()> {
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn held_locks(&self) -> Vec<LockKey> {
        Vec::new()
    }
}

#[test]
fn test_no_contention_is_a_failure() {
    let harness = seeded_harness(Database::with_engine(UnlockedEngine::default()), quick());

    let err = harness.run().expect_err("a run without lock conflicts must fail");
    assert!(matches!(err, HarnessError::NoContention), "unexpected error: {err}");
}
