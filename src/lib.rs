//! sfsight - automation client for the Snowsight web interface.
//!
//! Drives the same internal endpoints the browser application uses:
//! a six-stage authentication pipeline producing a reusable session
//! context, then plain CRUD over worksheets, dashboards, folders, filters,
//! and query monitoring.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod storage;

pub use error::{ExitCode, Result, SightError};
