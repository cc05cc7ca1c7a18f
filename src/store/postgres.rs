//! PostgreSQL-backed student store.
//!
//! Each student is one row; the test history is kept as a JSONB document so
//! an append is a single-row update.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{info, instrument};

use crate::error::StorageError;
use crate::metrics;
use crate::records::{StudentRecord, TestEntry};

use super::StudentStore;

/// Row shape of the `students` table.
#[derive(Debug, FromRow)]
struct StudentRow {
    student_id: String,
    name: String,
    course: String,
    tests: Json<Vec<TestEntry>>,
}

impl From<StudentRow> for StudentRecord {
    fn from(row: StudentRow) -> Self {
        Self {
            student_id: row.student_id,
            name: row.name,
            course: row.course,
            tests: row.tests.0,
        }
    }
}

/// Student store over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool to `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("migrations applied");
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error, student_id: &str) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::DuplicateKey {
            student_id: student_id.to_string(),
        },
        _ => StorageError::Database(err),
    }
}

impl StudentStore for PgStore {
    #[instrument(skip(self))]
    async fn find(&self, student_id: &str) -> Result<Option<StudentRecord>, StorageError> {
        let _timer = metrics::timer_store_operation("find");

        let row = sqlx::query_as::<_, StudentRow>(
            "SELECT student_id, name, course, tests FROM students WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StudentRecord::from))
    }

    #[instrument(skip(self, record), fields(student_id = %record.student_id))]
    async fn insert(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let _timer = metrics::timer_store_operation("insert");

        sqlx::query(
            "INSERT INTO students (student_id, name, course, tests) VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.student_id)
        .bind(&record.name)
        .bind(&record.course)
        .bind(Json(&record.tests))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &record.student_id))?;

        Ok(())
    }

    #[instrument(skip(self, record), fields(student_id = %record.student_id))]
    async fn update(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let _timer = metrics::timer_store_operation("update");

        let result = sqlx::query("UPDATE students SET tests = $2 WHERE student_id = $1")
            .bind(&record.student_id)
            .bind(Json(&record.tests))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::MissingRecord {
                student_id: record.student_id.clone(),
            });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let _timer = metrics::timer_store_operation("list");

        let rows = sqlx::query_as::<_, StudentRow>(
            "SELECT student_id, name, course, tests FROM students ORDER BY created_at, student_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StudentRecord::from).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("postgres pool closed");
    }
}
