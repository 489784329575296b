//! Core library for the photo contest entry intake service.
//!
//! The crate is organized around the two stateful surfaces of the system: the
//! submission intake pipeline, which persists each applicant as a folder tree
//! on disk, and the back office, which reads what the pipeline wrote. The
//! fiscal-code validator is a pure leaf module consumed by both the intake
//! routes and the CLI.

pub mod backoffice;
pub mod config;
pub mod error;
pub mod fiscal_code;
pub mod intake;
pub mod telemetry;
