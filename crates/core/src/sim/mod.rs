//! Test orchestration and discovery.
//!
//! Sequences one test image through the pipeline and finds candidate images on disk.

/// Recursive test-image listing.
pub mod discovery;
/// Single-image pipeline orchestration.
pub mod orchestrator;

pub use discovery::{BIN_SUFFIX, list_candidates, list_candidates_with_suffix};
pub use orchestrator::{PipelineState, RunFailure, RunReport, TestOrchestrator};
