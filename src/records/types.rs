//! Student record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single graded test in a student's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEntry {
    /// Score achieved.
    pub marks: f64,
    /// Maximum possible score.
    pub total_marks: f64,
    /// When the entry was recorded.
    pub date: DateTime<Utc>,
}

impl TestEntry {
    /// Create an entry stamped with the current time.
    pub fn new(marks: f64, total_marks: f64) -> Self {
        Self {
            marks,
            total_marks,
            date: Utc::now(),
        }
    }
}

/// A student and their append-only test history, keyed by `student_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Unique, immutable key.
    pub student_id: String,
    /// Student name.
    pub name: String,
    /// Course the student is enrolled in.
    pub course: String,
    /// Test history in submission order.
    #[serde(default)]
    pub tests: Vec<TestEntry>,
}

impl StudentRecord {
    /// Create a record with an empty history.
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            course: course.into(),
            tests: Vec::new(),
        }
    }

    /// Append a test entry.
    pub fn push_test(&mut self, entry: TestEntry) {
        self.tests.push(entry);
    }

    /// Whether any tests have been recorded.
    pub fn has_tests(&self) -> bool {
        !self.tests.is_empty()
    }
}

/// A validated test submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSubmission {
    /// Target student.
    pub student_id: String,
    /// Name used if the student is new; required in that case.
    pub name: Option<String>,
    /// Course used if the student is new; required in that case.
    pub course: Option<String>,
    /// Score achieved.
    pub marks: f64,
    /// Maximum possible score.
    pub total_marks: f64,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Whether a new record was created for this submission.
    pub created: bool,
    /// History length after the append.
    pub test_count: usize,
}

/// Message returned when a student exists but has no tests.
pub const NO_RECORDS_MESSAGE: &str = "no records";

/// A student's performance view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Performance {
    /// The student has at least one test.
    History {
        /// Student name.
        name: String,
        /// Full ordered history.
        tests: Vec<TestEntry>,
    },
    /// The student exists with an empty history.
    NoRecords {
        /// Student name.
        name: String,
        /// Always [`NO_RECORDS_MESSAGE`].
        message: &'static str,
    },
}

impl Performance {
    /// Build the view for a record.
    pub fn from_record(record: StudentRecord) -> Self {
        if record.has_tests() {
            Self::History {
                name: record.name,
                tests: record.tests,
            }
        } else {
            Self::NoRecords {
                name: record.name,
                message: NO_RECORDS_MESSAGE,
            }
        }
    }

    /// Student name.
    pub fn name(&self) -> &str {
        match self {
            Self::History { name, .. } | Self::NoRecords { name, .. } => name,
        }
    }

    /// Test history, empty for [`Performance::NoRecords`].
    pub fn tests(&self) -> &[TestEntry] {
        match self {
            Self::History { tests, .. } => tests,
            Self::NoRecords { .. } => &[],
        }
    }
}
