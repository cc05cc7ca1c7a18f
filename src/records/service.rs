//! Student record service: upsert-by-key submissions and aggregate queries.

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ServiceError, StorageError, ValidationError};
use crate::metrics;
use crate::store::StudentStore;

use super::attainment::{AttainmentPolicy, AttainmentReport};
use super::types::{Performance, StudentRecord, SubmitOutcome, TestEntry, TestSubmission};
use super::validation::validate_submission;

/// The sole writer of student records.
#[derive(Debug, Clone)]
pub struct StudentService<S> {
    store: S,
    policy: AttainmentPolicy,
}

fn storage_failure(err: StorageError) -> ServiceError {
    error!(error = %err, "storage operation failed");
    metrics::inc_storage_errors();
    ServiceError::Storage(err)
}

/// Whether a submitted value is present and disagrees with the stored one.
fn differs(submitted: &Option<String>, stored: &str) -> bool {
    submitted.as_deref().is_some_and(|value| value != stored)
}

fn rejected(err: ValidationError) -> ServiceError {
    debug!(error = %err, "submission rejected");
    metrics::inc_validation_failures(err.field().unwrap_or("body"));
    ServiceError::Validation(err)
}

impl<S: StudentStore> StudentService<S> {
    /// Create a service over `store` with the given attainment policy.
    pub fn new(store: S, policy: AttainmentPolicy) -> Self {
        Self { store, policy }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate a raw payload, then submit it.
    ///
    /// Validation failures never reach the store.
    pub async fn submit_payload(&self, payload: &Value) -> Result<SubmitOutcome, ServiceError> {
        let submission = validate_submission(payload).map_err(rejected)?;

        self.submit_test(submission).await
    }

    /// Append a test to the student's history, creating the record on first sight.
    ///
    /// Creating a record requires `name` and `course`; a missing one fails
    /// with a validation error before anything is written. On repeat
    /// submissions both may be omitted and the stored values always win.
    #[instrument(skip(self, submission), fields(student_id = %submission.student_id))]
    pub async fn submit_test(
        &self,
        submission: TestSubmission,
    ) -> Result<SubmitOutcome, ServiceError> {
        let existing = self
            .store
            .find(&submission.student_id)
            .await
            .map_err(storage_failure)?;

        let entry = TestEntry::new(submission.marks, submission.total_marks);

        let outcome = match existing {
            Some(mut record) => {
                let name_differs = differs(&submission.name, &record.name);
                let course_differs = differs(&submission.course, &record.course);

                if name_differs || course_differs {
                    warn!(
                        stored_name = %record.name,
                        stored_course = %record.course,
                        submitted_name = ?submission.name,
                        submitted_course = ?submission.course,
                        "name/course differ from stored record, keeping stored values"
                    );
                }

                record.push_test(entry);
                self.store.update(&record).await.map_err(storage_failure)?;

                SubmitOutcome {
                    created: false,
                    test_count: record.tests.len(),
                }
            }
            None => {
                let (name, course) = match (submission.name, submission.course) {
                    (Some(name), Some(course)) => (name, course),
                    (None, _) => return Err(rejected(ValidationError::Missing { field: "name" })),
                    (_, None) => {
                        return Err(rejected(ValidationError::Missing { field: "course" }));
                    }
                };

                let mut record = StudentRecord::new(submission.student_id, name, course);
                record.push_test(entry);
                self.store.insert(&record).await.map_err(storage_failure)?;

                info!("created student record");
                metrics::inc_students_created();

                SubmitOutcome {
                    created: true,
                    test_count: record.tests.len(),
                }
            }
        };

        metrics::inc_tests_submitted();
        debug!(test_count = outcome.test_count, "test recorded");

        Ok(outcome)
    }

    /// A student's name and full test history.
    #[instrument(skip(self))]
    pub async fn get_performance(&self, student_id: &str) -> Result<Performance, ServiceError> {
        let record = self
            .store
            .find(student_id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| ServiceError::NotFound {
                student_id: student_id.to_string(),
            })?;

        Ok(Performance::from_record(record))
    }

    /// Every stored record.
    pub async fn list_all(&self) -> Result<Vec<StudentRecord>, ServiceError> {
        self.store.list().await.map_err(storage_failure)
    }

    /// Average marks over every test of every student, bucketed by the policy.
    pub async fn calculate_attainment(&self) -> Result<AttainmentReport, ServiceError> {
        let records = self.list_all().await?;

        let report = self.policy.evaluate(
            records
                .iter()
                .flat_map(|r| r.tests.iter())
                .map(|t| t.marks),
        );

        debug!(
            average_marks = report.average_marks,
            attainment_level = report.attainment_level,
            "attainment calculated"
        );

        Ok(report)
    }
}
