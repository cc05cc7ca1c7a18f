//! Student test score recording and attainment service.
//!
//! Records test submissions per student and computes a coarse attainment
//! level from the average marks across every recorded test.
//!
//! # Model
//!
//! A student record is keyed by `studentId` and holds an append-only test
//! history. The first submission for an unseen id creates the record; later
//! submissions append to it:
//!
//! ```text
//! POST {S1, Ann, CS1, 80/100}  ->  S1: Ann, CS1, [80/100]
//! POST {S1, 40/50}             ->  S1: Ann, CS1, [80/100, 40/50]
//! ```
//!
//! Attainment averages `marks` over every test of every student and maps an
//! average strictly above the threshold (default 50) to the upper level
//! (default 3), anything else to the default level (default 2).
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`records`]: Data model, validation, attainment, and the record service
//! - [`store`]: Persistence trait with PostgreSQL and in-memory backends
//! - [`api`]: HTTP routes
//! - [`metrics`]: Prometheus counters and latency histograms
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod records;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
