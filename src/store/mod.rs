//! Persistence for student records.
//!
//! This module handles:
//! - The [`StudentStore`] trait the record service writes through
//! - PostgreSQL-backed storage
//! - In-memory storage for local runs and tests

pub mod memory;
pub mod postgres;

use std::future::Future;

use crate::error::StorageError;
use crate::records::StudentRecord;

pub use memory::{MemoryStore, MemoryStoreConfig};
pub use postgres::PgStore;

/// Keyed store of [`StudentRecord`]s.
///
/// Implementations are cheap handles; clones share the same backing store.
/// Reads followed by writes are not atomic across calls.
pub trait StudentStore: Clone + Send + Sync + 'static {
    /// Look up a record by key.
    fn find(
        &self,
        student_id: &str,
    ) -> impl Future<Output = Result<Option<StudentRecord>, StorageError>> + Send;

    /// Insert a new record. Fails with [`StorageError::DuplicateKey`] if the key exists.
    fn insert(
        &self,
        record: &StudentRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Replace the test history of an existing record.
    ///
    /// `name` and `course` are never rewritten. Fails with
    /// [`StorageError::MissingRecord`] if the key does not exist.
    fn update(
        &self,
        record: &StudentRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// All records in creation order.
    fn list(&self) -> impl Future<Output = Result<Vec<StudentRecord>, StorageError>> + Send;

    /// Release the underlying connection.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
