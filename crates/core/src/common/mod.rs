//! Common types used throughout the testbench runner.
//!
//! This module holds the error taxonomy shared by the transcoder, the toolchain stages, and
//! the orchestrator, so that every failure reaches the CLI through a single typed path.

/// Error types and failure classification.
pub mod error;

pub use error::{FailureKind, HarnessError};
