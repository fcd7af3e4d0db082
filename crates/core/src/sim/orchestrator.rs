//! Single-image test orchestration.
//!
//! This module runs one test image through the whole pipeline. It performs:
//! 1. **Validation:** Resolves the image path to an absolute path and rejects missing files
//!    before anything is written or spawned.
//! 2. **Transcoding:** Writes the memory image to its fixed location.
//! 3. **Compile and simulate:** Rebuilds the artifact and runs it.
//!
//! The pipeline moves `Start → InputValidated → Transcoded → Compiled → Simulated → Done`.
//! The first failure is terminal: nothing is retried and the failing state is reported with
//! the error.

use std::fmt;
use std::path::{self, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::common::HarnessError;
use crate::config::HarnessConfig;
use crate::image::{TranscodeSummary, transcode};
use crate::toolchain::{
    ProcessRunner, SimulationOutcome, SimulationRunner, Stage, ToolRunner, ToolchainDriver,
};

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Nothing has been checked yet.
    Start,
    /// The test image exists.
    InputValidated,
    /// The memory image has been written.
    Transcoded,
    /// The simulation artifact has been built.
    Compiled,
    /// The simulation ran to a successful exit.
    Simulated,
    /// The run completed successfully.
    Done,
    /// The run ended with an error.
    Failed,
}

impl PipelineState {
    /// The state a successful step moves to. `Done` and `Failed` are terminal.
    pub const fn advance(self) -> Self {
        match self {
            Self::Start => Self::InputValidated,
            Self::InputValidated => Self::Transcoded,
            Self::Transcoded => Self::Compiled,
            Self::Compiled => Self::Simulated,
            Self::Simulated | Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::InputValidated => "input-validated",
            Self::Transcoded => "transcoded",
            Self::Compiled => "compiled",
            Self::Simulated => "simulated",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Absolute path of the test image.
    pub image: PathBuf,
    /// Where the memory image was written.
    pub memory_image: PathBuf,
    /// Transcoder result.
    pub transcode: TranscodeSummary,
    /// Compiler and simulator invocations.
    pub outcome: SimulationOutcome,
}

/// A run that ended in [`PipelineState::Failed`].
#[derive(Debug, Error)]
#[error("{error} (last completed state: {reached})")]
pub struct RunFailure {
    /// Last state the run reached before failing.
    pub reached: PipelineState,
    /// What went wrong.
    pub error: HarnessError,
}

impl RunFailure {
    /// Process exit code for this failure.
    pub const fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// Runs test images through transcode, compile, and simulate.
#[derive(Debug)]
pub struct TestOrchestrator<R = ProcessRunner> {
    config: HarnessConfig,
    runner: R,
}

impl TestOrchestrator<ProcessRunner> {
    /// Creates an orchestrator that spawns real tool processes.
    pub const fn new(config: HarnessConfig) -> Self {
        Self::with_runner(config, ProcessRunner::new())
    }
}

impl<R: ToolRunner> TestOrchestrator<R> {
    /// Creates an orchestrator that issues tool requests through `runner`.
    pub const fn with_runner(config: HarnessConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Configuration used for every run.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs one test image through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`RunFailure`] holding the first error and the last state reached. A missing
    /// image fails in [`PipelineState::Start`] before any file is written or tool started.
    pub fn run(&self, test_image: impl AsRef<Path>) -> Result<RunReport, RunFailure> {
        let mut state = PipelineState::Start;
        let fail = |reached: PipelineState, error: HarnessError| {
            debug!(%reached, to = %PipelineState::Failed, "pipeline transition");
            RunFailure { reached, error }
        };

        let image = resolve_input(test_image.as_ref()).map_err(|e| fail(state, e))?;
        state = step(state);
        info!(image = %image.display(), "running test image");

        let memory_image = self.config.memory_image_path();
        let summary = transcode(&image, &memory_image).map_err(|e| fail(state, e))?;
        state = step(state);
        info!(
            memory_image = %memory_image.display(),
            words = summary.words,
            "memory image ready"
        );

        let driver = ToolchainDriver::new(&self.config, &self.runner);
        let outcome = SimulationRunner::new(driver).simulate().map_err(|e| {
            // A simulate-stage error means the compile inside `simulate` already succeeded.
            let reached = if e.stage() == Some(Stage::Simulate) {
                state.advance()
            } else {
                state
            };
            fail(reached, e)
        })?;
        state = step(state); // compiled
        state = step(state); // simulated
        state = step(state);
        info!(%state, image = %image.display(), "test image finished");

        Ok(RunReport {
            image,
            memory_image,
            transcode: summary,
            outcome,
        })
    }
}

fn step(state: PipelineState) -> PipelineState {
    let next = state.advance();
    debug!(from = %state, to = %next, "pipeline transition");
    next
}

fn resolve_input(image: &Path) -> Result<PathBuf, HarnessError> {
    let absolute = path::absolute(image).map_err(|e| HarnessError::io(image, e))?;
    match absolute.try_exists() {
        Ok(true) => Ok(absolute),
        Ok(false) => Err(HarnessError::InputNotFound { path: absolute }),
        Err(e) => Err(HarnessError::io(absolute, e)),
    }
}
