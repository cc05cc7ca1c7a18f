//! In-memory student store.
//!
//! Backs local runs without a database and every unit test. Failure modes and
//! latency can be injected through [`MemoryStoreConfig`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::error::StorageError;
use crate::metrics;
use crate::records::StudentRecord;

use super::StudentStore;

/// Configuration for store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Whether to fail `find` and `list`.
    pub fail_reads: bool,
    /// Whether to fail `insert` and `update`.
    pub fail_writes: bool,
    /// Simulated latency per operation in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    record: StudentRecord,
}

/// Student store held in a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Store configuration.
    config: MemoryStoreConfig,
    /// Records by student id.
    records: Arc<DashMap<String, Stored>>,
    /// Creation sequence for ordering `list`.
    next_seq: Arc<AtomicU64>,
    /// Operations attempted, including failed ones.
    operations: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store that never fails.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create an empty store with custom behavior.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            records: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
            operations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of operations attempted against this store.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn begin(&self, operation: &'static str) {
        self.operations.fetch_add(1, Ordering::SeqCst);
        debug!(operation, "memory store operation");

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if self.config.fail_reads {
            return Err(StorageError::Unavailable("memory store read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StorageError> {
        if self.config.fail_writes {
            return Err(StorageError::Unavailable("memory store write failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentStore for MemoryStore {
    async fn find(&self, student_id: &str) -> Result<Option<StudentRecord>, StorageError> {
        let _timer = metrics::timer_store_operation("find");
        self.begin("find").await;
        self.check_read()?;

        Ok(self.records.get(student_id).map(|stored| stored.record.clone()))
    }

    async fn insert(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let _timer = metrics::timer_store_operation("insert");
        self.begin("insert").await;
        self.check_write()?;

        match self.records.entry(record.student_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateKey {
                student_id: record.student_id.clone(),
            }),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(Stored {
                    seq,
                    record: record.clone(),
                });
                Ok(())
            }
        }
    }

    async fn update(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let _timer = metrics::timer_store_operation("update");
        self.begin("update").await;
        self.check_write()?;

        match self.records.get_mut(&record.student_id) {
            Some(mut stored) => {
                stored.record.tests = record.tests.clone();
                Ok(())
            }
            None => Err(StorageError::MissingRecord {
                student_id: record.student_id.clone(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let _timer = metrics::timer_store_operation("list");
        self.begin("list").await;
        self.check_read()?;

        let mut stored: Vec<Stored> = self.records.iter().map(|r| r.value().clone()).collect();
        stored.sort_by_key(|s| s.seq);

        Ok(stored.into_iter().map(|s| s.record).collect())
    }

    async fn close(&self) {
        debug!(records = self.records.len(), "closing memory store");
    }
}
