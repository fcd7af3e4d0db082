//! Testbench runner CLI.
//!
//! This binary is the only place that decides the process exit code. It performs:
//! 1. **Run:** Transcode one test binary, compile the testbench, run the simulation, and print
//!    the simulation output. Exit 0 on success, 1 on any failure.
//! 2. **List:** Print every candidate test binary under a directory (`--list`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tbrun_core::config::HarnessConfig;
use tbrun_core::sim::{self, RunFailure, TestOrchestrator};
use tbrun_core::{FailureKind, HarnessError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tbrun",
    author,
    version,
    about = "Run a RISC-V test binary on the HDL testbench",
    long_about = "Converts a raw test binary into the testbench memory image, compiles the \
                  design with the configured HDL compiler, and runs the simulation.\n\n\
                  Examples:\n  tbrun sim/testcases/generated/rv32ui-p-add.bin\n  \
                  tbrun --root ../core --config tbrun.json rv32ui-p-and.bin\n  \
                  tbrun --list sim/testcases/generated"
)]
struct Cli {
    /// Raw test binary to run.
    image: Option<PathBuf>,

    /// Design repository root (overrides the configured root).
    #[arg(long)]
    root: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List candidate test binaries under this directory and exit.
    #[arg(long, value_name = "DIR", conflicts_with = "image")]
    list: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and exit 0; real parse errors are usage errors.
            let code = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.list {
        Some(dir) => cmd_list(&dir),
        None => cmd_run(cli.image.as_deref(), cli.root, cli.config.as_deref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints every `.bin` under `dir`, one per line.
fn cmd_list(dir: &Path) -> Result<(), u8> {
    let candidates = sim::list_candidates(dir).map_err(|e| report(&e))?;
    for path in candidates {
        println!("{}", path.display());
    }
    Ok(())
}

/// Runs one test image and prints the simulation output.
fn cmd_run(
    image: Option<&Path>,
    root: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<(), u8> {
    let Some(image) = image else {
        return Err(report(&HarnessError::Usage(
            "missing test binary path (e.g. sim/testcases/generated/rv32ui-p-and.bin)".to_string(),
        )));
    };

    let mut config = match config_path {
        Some(path) => HarnessConfig::load(path).map_err(|e| report(&e))?,
        None => HarnessConfig::default(),
    };
    if let Some(root) = root {
        config = config.with_project_root(root);
    }

    let orchestrator = TestOrchestrator::new(config);
    match orchestrator.run(image) {
        Ok(run) => {
            println!("[*] Simulation output:");
            print!("{}", run.outcome.output());
            Ok(())
        }
        Err(failure) => Err(report_failure(&failure)),
    }
}

fn report_failure(failure: &RunFailure) -> u8 {
    tracing::debug!(reached = %failure.reached, "run failed");
    report(&failure.error)
}

/// Prints a failure with any captured tool output and returns the exit code.
fn report(error: &HarnessError) -> u8 {
    eprintln!("[!] {}: {error}", error.kind());
    if let Some(invocation) = error.invocation() {
        let heading = match error.kind() {
            FailureKind::CompileFailure => "Compilation failed",
            _ => "Simulation failed",
        };
        eprintln!("{heading}; command: {}", invocation.command_line());
        eprintln!("STDOUT:\n{}", invocation.stdout);
        eprintln!("STDERR:\n{}", invocation.stderr);
    }
    u8::try_from(error.exit_code()).unwrap_or(1)
}
