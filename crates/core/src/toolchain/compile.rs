//! Compile stage.
//!
//! Builds the simulation artifact by running the HDL compiler over the source manifest. The
//! argument order is fixed: output flag and artifact, include flags, extra flags, then the
//! testbench followed by the design sources in manifest order.

use std::ffi::OsString;

use tracing::{error, info};

use super::invocation::{Stage, ToolRequest, ToolRunner, ToolchainInvocation};
use crate::common::HarnessError;
use crate::config::HarnessConfig;

/// Runs the compile stage for one configuration.
#[derive(Debug)]
pub struct ToolchainDriver<'a, R: ?Sized> {
    config: &'a HarnessConfig,
    runner: &'a R,
}

impl<'a, R: ToolRunner + ?Sized> ToolchainDriver<'a, R> {
    /// Creates a driver that issues its requests through `runner`.
    pub const fn new(config: &'a HarnessConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Configuration this driver compiles with.
    pub const fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    /// Runner this driver issues requests through.
    pub const fn runner(&self) -> &'a R {
        self.runner
    }

    /// Builds the compiler request without running it.
    pub fn compile_request(&self) -> ToolRequest {
        let compiler = &self.config.compiler;
        let root = &self.config.layout.project_root;

        let mut args: Vec<OsString> = vec![
            compiler.output_flag.clone().into(),
            self.config.artifact_path().into_os_string(),
        ];
        for dir in &compiler.include_dirs {
            args.push(compiler.include_flag.clone().into());
            args.push(root.join(dir).into_os_string());
        }
        args.extend(compiler.extra_args.iter().map(OsString::from));
        args.extend(
            self.config
                .manifest
                .resolve(root)
                .into_iter()
                .map(std::path::PathBuf::into_os_string),
        );

        ToolRequest {
            stage: Stage::Compile,
            program: compiler.program.clone(),
            args,
            working_dir: self.config.layout.work_dir.clone(),
            timeout: compiler.timeout(),
        }
    }

    /// Compiles the manifest into the artifact, overwriting any previous artifact.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::CompileFailure`] carrying the captured output if the compiler
    /// exits unsuccessfully, or the runner's error if it could not be run to completion.
    pub fn compile(&self) -> Result<ToolchainInvocation, HarnessError> {
        let request = self.compile_request();
        info!(command = %request.command_line(), "compiling simulation");

        let invocation = self.runner.run(&request)?;
        if !invocation.succeeded() {
            error!(status = ?invocation.status, "compiler exited unsuccessfully");
            return Err(HarnessError::CompileFailure {
                invocation: Box::new(invocation),
            });
        }
        Ok(invocation)
    }
}
