//! Toolchain invocation records and the runner trait.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::HarnessError;

/// Pipeline stage that owns a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// HDL compiler producing the simulation artifact.
    Compile,
    /// Runner executing the simulation artifact.
    Simulate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => f.write_str("compile"),
            Self::Simulate => f.write_str("simulate"),
        }
    }
}

/// A tool invocation that has not run yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    /// Stage this invocation belongs to.
    pub stage: Stage,
    /// Program name or path.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Directory the program runs in.
    pub working_dir: PathBuf,
    /// Wall-clock limit; the program is killed once it elapses.
    pub timeout: Duration,
}

impl ToolRequest {
    /// Renders the program and its arguments as one space-separated line.
    pub fn command_line(&self) -> String {
        command_line(&self.program, &self.args)
    }
}

/// A finished tool invocation with its captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInvocation {
    /// Stage this invocation belonged to.
    pub stage: Stage,
    /// Program name or path as requested.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Captured standard output, decoded lossily as UTF-8.
    pub stdout: String,
    /// Captured standard error, decoded lossily as UTF-8.
    pub stderr: String,
    /// Exit status, or `None` if the process was terminated by a signal.
    pub status: Option<i32>,
}

impl ToolchainInvocation {
    /// Creates a record for `request` with the given outcome.
    pub fn from_request(
        request: &ToolRequest,
        status: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            stage: request.stage,
            program: request.program.clone(),
            args: request.args.clone(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            status,
        }
    }

    /// Whether the tool exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }

    /// Renders the program and its arguments as one space-separated line.
    pub fn command_line(&self) -> String {
        command_line(&self.program, &self.args)
    }
}

fn command_line(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Executes tool requests.
///
/// A nonzero exit status is not an error at this level; the stage that issued the request
/// decides what it means. Implementations return `Err` only when the tool could not be run to
/// completion (not found, not startable, or over its time limit).
pub trait ToolRunner {
    /// Runs `request` to completion and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ToolNotFound`], [`HarnessError::Spawn`], or
    /// [`HarnessError::StageTimeout`] when the tool cannot be run to completion.
    fn run(&self, request: &ToolRequest) -> Result<ToolchainInvocation, HarnessError>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, request: &ToolRequest) -> Result<ToolchainInvocation, HarnessError> {
        (**self).run(request)
    }
}
