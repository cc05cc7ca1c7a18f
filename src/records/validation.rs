//! Field checks for test submissions.

use serde_json::{Map, Value};

use crate::error::ValidationError;

use super::types::TestSubmission;

/// Largest accepted absolute value for `marks` and `totalMarks`.
pub const MARKS_LIMIT: u64 = 1_000_000_000;

/// Check a submission payload and extract the typed submission.
///
/// Fields are checked in order `studentId`, `name`, `course`, `marks`,
/// `totalMarks`; the first failure is reported. `name` and `course` may be
/// omitted here; the service requires them only when the student is new.
/// Extra fields are ignored.
pub fn validate_submission(payload: &Value) -> Result<TestSubmission, ValidationError> {
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    Ok(TestSubmission {
        student_id: required_string(fields, "studentId")?,
        name: optional_string(fields, "name")?,
        course: optional_string(fields, "course")?,
        marks: required_number(fields, "marks")?,
        total_marks: required_number(fields, "totalMarks")?,
    })
}

fn present<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(value) => Ok(value),
    }
}

fn required_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    optional_string(fields, field)?.ok_or(ValidationError::Missing { field })
}

/// Absent, null, and blank all read as `None`; any other non-string is an error.
fn optional_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    let value = match fields.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value.as_str().ok_or(ValidationError::InvalidType {
            field,
            expected: "string",
        })?,
    };

    if value.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(value.to_string()))
}

fn required_number(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    let value = present(fields, field)?
        .as_f64()
        .ok_or(ValidationError::InvalidType {
            field,
            expected: "number",
        })?;

    if value.abs() > MARKS_LIMIT as f64 {
        return Err(ValidationError::OutOfRange {
            field,
            limit: MARKS_LIMIT,
        });
    }

    Ok(value)
}
