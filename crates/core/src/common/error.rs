//! Error taxonomy for the testbench runner.
//!
//! This module defines the single error type surfaced by every stage. It provides:
//! 1. **Typed failures:** One variant per way a run can end unsuccessfully, each carrying the
//!    diagnostic context (paths, captured tool output, exit status) needed to report it.
//! 2. **Classification:** `FailureKind` collapses variants into the reporting categories used
//!    by the CLI, including the environment failures (missing tools, unreadable files).
//! 3. **Exit codes:** Every failure maps to process exit code 1; there is no partial success.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::toolchain::{Stage, ToolchainInvocation};

/// Process exit code reported for every failure kind.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Reporting category of a [`HarnessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bad or missing command-line argument.
    Usage,
    /// The test image does not exist.
    InputNotFound,
    /// The HDL compiler exited with a nonzero status.
    CompileFailure,
    /// The compiled simulation exited with a nonzero status.
    SimulationFailure,
    /// A toolchain invocation exceeded its time limit.
    StageTimeout,
    /// The host environment prevented the run (I/O, configuration, missing or unspawnable tool).
    Environment,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Usage => "usage error",
            Self::InputNotFound => "input not found",
            Self::CompileFailure => "compile failure",
            Self::SimulationFailure => "simulation failure",
            Self::StageTimeout => "stage timeout",
            Self::Environment => "environment error",
        };
        f.write_str(name)
    }
}

/// Every way a transcode, toolchain stage, or whole run can fail.
///
/// Failures are terminal: nothing in this crate retries or recovers from them locally.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Bad or missing command-line argument.
    #[error("usage: {0}")]
    Usage(String),

    /// The test image to transcode does not exist.
    #[error("test image '{}' does not exist", .path.display())]
    InputNotFound {
        /// Absolute path that was looked up.
        path: PathBuf,
    },

    /// A file could not be read, written, or listed.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path being accessed when the error occurred.
        path: PathBuf,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// A configuration document could not be parsed.
    #[error("invalid configuration '{}': {source}", .path.display())]
    Config {
        /// Path of the configuration document (`<inline>` for in-memory JSON).
        path: PathBuf,
        /// Underlying deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// A tool program could not be resolved on `PATH`.
    #[error("{stage} tool '{program}' not found")]
    ToolNotFound {
        /// Stage that needed the tool.
        stage: Stage,
        /// Program name as configured.
        program: String,
        /// Resolution error.
        #[source]
        source: which::Error,
    },

    /// A resolved tool program could not be started.
    #[error("failed to start {stage} tool '{program}': {source}")]
    Spawn {
        /// Stage that was starting.
        stage: Stage,
        /// Program name as configured.
        program: String,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// The HDL compiler exited unsuccessfully.
    #[error("compilation failed ({})", describe_status(.invocation.status))]
    CompileFailure {
        /// Captured compiler invocation.
        invocation: Box<ToolchainInvocation>,
    },

    /// The compiled simulation exited unsuccessfully.
    #[error("simulation failed ({})", describe_status(.invocation.status))]
    SimulationFailure {
        /// Captured simulator invocation.
        invocation: Box<ToolchainInvocation>,
    },

    /// A toolchain invocation did not finish within its limit and was killed.
    #[error("{stage} stage '{program}' timed out after {} ms", .timeout.as_millis())]
    StageTimeout {
        /// Stage that timed out.
        stage: Stage,
        /// Program name as configured.
        program: String,
        /// Limit that was exceeded.
        timeout: Duration,
    },
}

impl HarnessError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the reporting category of this error.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Usage(_) => FailureKind::Usage,
            Self::InputNotFound { .. } => FailureKind::InputNotFound,
            Self::CompileFailure { .. } => FailureKind::CompileFailure,
            Self::SimulationFailure { .. } => FailureKind::SimulationFailure,
            Self::StageTimeout { .. } => FailureKind::StageTimeout,
            Self::Io { .. } | Self::Config { .. } | Self::ToolNotFound { .. } | Self::Spawn { .. } => {
                FailureKind::Environment
            }
        }
    }

    /// Returns the captured tool invocation for compile and simulation failures.
    pub fn invocation(&self) -> Option<&ToolchainInvocation> {
        match self {
            Self::CompileFailure { invocation } | Self::SimulationFailure { invocation } => {
                Some(invocation)
            }
            _ => None,
        }
    }

    /// Returns the toolchain stage this error came from, if any.
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::CompileFailure { .. } => Some(Stage::Compile),
            Self::SimulationFailure { .. } => Some(Stage::Simulate),
            Self::StageTimeout { stage, .. }
            | Self::ToolNotFound { stage, .. }
            | Self::Spawn { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit code for this failure.
    pub const fn exit_code(&self) -> i32 {
        FAILURE_EXIT_CODE
    }
}

fn describe_status(status: Option<i32>) -> String {
    status.map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exit status {code}"),
    )
}
