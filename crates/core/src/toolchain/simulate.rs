//! Simulate stage.
//!
//! Compile-then-run is a single operation: every simulation first rebuilds the artifact, and
//! the simulator is only started once that compile has succeeded.

use std::ffi::OsString;

use tracing::{error, info};

use super::compile::ToolchainDriver;
use super::invocation::{Stage, ToolRequest, ToolRunner, ToolchainInvocation};
use crate::common::HarnessError;

/// Both invocations of a successful compile-and-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Compiler invocation that produced the artifact.
    pub compile: ToolchainInvocation,
    /// Simulator invocation; its stdout is the observable result of the run.
    pub simulate: ToolchainInvocation,
}

impl SimulationOutcome {
    /// Standard output of the simulation.
    pub fn output(&self) -> &str {
        &self.simulate.stdout
    }
}

/// Runs the simulate stage on top of a compile stage.
#[derive(Debug)]
pub struct SimulationRunner<'a, R: ?Sized> {
    driver: ToolchainDriver<'a, R>,
}

impl<'a, R: ToolRunner + ?Sized> SimulationRunner<'a, R> {
    /// Creates a runner that compiles with `driver` before every simulation.
    pub const fn new(driver: ToolchainDriver<'a, R>) -> Self {
        Self { driver }
    }

    /// Builds the simulator request without running it.
    pub fn simulate_request(&self) -> ToolRequest {
        let config = self.driver.config();
        let mut args = vec![config.artifact_path().into_os_string()];
        args.extend(config.simulator.extra_args.iter().map(OsString::from));

        ToolRequest {
            stage: Stage::Simulate,
            program: config.simulator.program.clone(),
            args,
            working_dir: config.layout.work_dir.clone(),
            timeout: config.simulator.timeout(),
        }
    }

    /// Compiles the artifact, then runs it.
    ///
    /// # Errors
    ///
    /// Returns any compile stage error unchanged (the simulator is then never started),
    /// [`HarnessError::SimulationFailure`] with the captured output if the simulator exits
    /// unsuccessfully, or the runner's error if it could not be run to completion.
    pub fn simulate(&self) -> Result<SimulationOutcome, HarnessError> {
        let compile = self.driver.compile()?;

        let request = self.simulate_request();
        info!(command = %request.command_line(), "running simulation");

        let simulate = self.driver.runner().run(&request)?;
        if !simulate.succeeded() {
            error!(status = ?simulate.status, "simulation exited unsuccessfully");
            return Err(HarnessError::SimulationFailure {
                invocation: Box::new(simulate),
            });
        }
        Ok(SimulationOutcome { compile, simulate })
    }
}
