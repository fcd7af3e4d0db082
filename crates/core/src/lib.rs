//! Testbench runner library.
//!
//! This crate prepares raw RISC-V test binaries for an HDL testbench and drives the external
//! toolchain that builds and runs the simulation. It provides:
//! 1. **Image:** Transcoding of raw binaries into hex-per-line memory images for `$readmemh`.
//! 2. **Toolchain:** Compile (HDL compiler over a source manifest) and simulate stages with
//!    bounded, typed subprocess invocation.
//! 3. **Simulation:** The fail-fast orchestrator and recursive discovery of test images.
//! 4. **Configuration:** Tool identities, timeouts, artifact layout, and the source manifest.

/// Common types shared by every stage (error taxonomy, failure kinds).
pub mod common;
/// Harness configuration (tools, timeouts, layout, source manifest).
pub mod config;
/// Binary to memory-image transcoding.
pub mod image;
/// Test orchestration and test-image discovery.
pub mod sim;
/// External toolchain invocation (compile and simulate stages).
pub mod toolchain;

/// Error type returned by every fallible operation in this crate.
pub use crate::common::{FailureKind, HarnessError};
/// Root configuration type; use `HarnessConfig::default()` or load from JSON.
pub use crate::config::HarnessConfig;
/// Single-image orchestrator; construct with `TestOrchestrator::new`.
pub use crate::sim::TestOrchestrator;
