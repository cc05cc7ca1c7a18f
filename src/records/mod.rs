//! Student performance records.
//!
//! This module handles:
//! - The record and test entry data model
//! - Submission validation
//! - Attainment averaging and bucketing
//! - The record service that ties them to a store

pub mod attainment;
pub mod service;
pub mod types;
pub mod validation;

pub use attainment::{AttainmentPolicy, AttainmentReport};
pub use service::StudentService;
pub use types::{
    Performance, StudentRecord, SubmitOutcome, TestEntry, TestSubmission, NO_RECORDS_MESSAGE,
};
pub use validation::validate_submission;
