//! External toolchain invocation.
//!
//! This module drives the two external tools a run needs. It provides:
//! 1. **Invocation records:** `ToolRequest` (what to run) and `ToolchainInvocation` (what happened).
//! 2. **Runner seam:** The `ToolRunner` trait, with `ProcessRunner` spawning real subprocesses
//!    under a wall-clock limit.
//! 3. **Compile stage:** `ToolchainDriver` builds the simulation artifact from the source manifest.
//! 4. **Simulate stage:** `SimulationRunner` compiles, then runs the artifact.
//!
//! Stages never call each other except that simulation always compiles first; a stage that
//! fails ends the pipeline.

/// Compile stage.
pub mod compile;
/// Invocation records and the runner trait.
pub mod invocation;
/// Subprocess runner with timeouts.
pub mod process;
/// Simulate stage.
pub mod simulate;

pub use compile::ToolchainDriver;
pub use invocation::{Stage, ToolRequest, ToolRunner, ToolchainInvocation};
pub use process::ProcessRunner;
pub use simulate::{SimulationOutcome, SimulationRunner};
