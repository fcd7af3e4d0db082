//! # Orchestrator Tests
//!
//! Pipeline sequencing, the fail-fast contract, and end-to-end runs with fake tools.

use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tbrun_core::image::TranscodeSummary;
use tbrun_core::sim::{PipelineState, TestOrchestrator};
use tbrun_core::toolchain::Stage;
use tbrun_core::{FailureKind, HarnessError};

use crate::common::harness::Fixture;
use crate::common::mocks::runner::{MockRunner, expect_stage, for_stage};

#[rstest]
#[case(PipelineState::Start, PipelineState::InputValidated)]
#[case(PipelineState::InputValidated, PipelineState::Transcoded)]
#[case(PipelineState::Transcoded, PipelineState::Compiled)]
#[case(PipelineState::Compiled, PipelineState::Simulated)]
#[case(PipelineState::Simulated, PipelineState::Done)]
#[case(PipelineState::Done, PipelineState::Done)]
#[case(PipelineState::Failed, PipelineState::Failed)]
fn test_state_advance(#[case] from: PipelineState, #[case] to: PipelineState) {
    assert_eq!(from.advance(), to);
}

#[test]
fn test_terminal_states() {
    assert!(PipelineState::Done.is_terminal());
    assert!(PipelineState::Failed.is_terminal());
    assert!(!PipelineState::Simulated.is_terminal());
}

#[test]
fn test_successful_run() {
    let fx = Fixture::new();
    let image = fx.write_image("tests/rv32ui-p-add.bin", &[0x13, 0, 0, 0, 0x73, 0, 0x10, 0]);
    let mut runner = MockRunner::new();
    expect_stage(&mut runner, Stage::Compile, 0, "");
    expect_stage(&mut runner, Stage::Simulate, 0, "TEST PASS\n");
    let orchestrator = TestOrchestrator::with_runner(fx.config.clone(), runner);

    let report = orchestrator.run(&image).unwrap();

    assert_eq!(report.image, image);
    assert_eq!(report.memory_image, fx.memory_image());
    assert_eq!(report.transcode, TranscodeSummary { words: 2, dropped_bytes: 0 });
    assert_eq!(report.outcome.output(), "TEST PASS\n");
    assert_eq!(fx.read_memory_image(), "00000013\n00100073\n");
}

#[test]
fn test_relative_input_is_made_absolute() {
    let fx = Fixture::new();
    let image = fx.write_image("rel.bin", &[0; 4]);
    let cwd = std::env::current_dir().unwrap();
    let relative = pathdiff(&image, &cwd);
    let mut runner = MockRunner::new();
    expect_stage(&mut runner, Stage::Compile, 0, "");
    expect_stage(&mut runner, Stage::Simulate, 0, "");

    let report = TestOrchestrator::with_runner(fx.config.clone(), runner)
        .run(&relative)
        .unwrap();

    assert!(report.image.is_absolute());
    assert_eq!(report.image.canonicalize().unwrap(), image.canonicalize().unwrap());
}

/// Builds a `../..`-style path from `base` to `target`.
fn pathdiff(target: &Path, base: &Path) -> std::path::PathBuf {
    let target: Vec<_> = target.components().collect();
    let base: Vec<_> = base.components().collect();
    let common = target.iter().zip(&base).take_while(|(a, b)| a == b).count();
    let mut rel = std::path::PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part);
    }
    rel
}

#[test]
fn test_missing_input_fails_before_any_side_effect() {
    let fx = Fixture::new();
    // No expectations: any tool request panics the mock.
    let orchestrator = TestOrchestrator::with_runner(fx.config.clone(), MockRunner::new());

    let failure = orchestrator.run(fx.dir.path().join("missing.bin")).unwrap_err();

    assert_eq!(failure.reached, PipelineState::Start);
    assert_eq!(failure.error.kind(), FailureKind::InputNotFound);
    assert_eq!(failure.exit_code(), 1);
    assert!(!fx.memory_image().exists());
    assert!(!fx.config.artifact_path().exists());
}

#[test]
fn test_compile_failure_skips_simulation() {
    let fx = Fixture::new();
    let image = fx.write_image("a.bin", &[1, 2, 3, 4]);
    let mut runner = MockRunner::new();
    expect_stage(&mut runner, Stage::Compile, 1, "");
    runner.expect_run().withf(for_stage(Stage::Simulate)).times(0);

    let failure = TestOrchestrator::with_runner(fx.config.clone(), runner)
        .run(&image)
        .unwrap_err();

    assert_eq!(failure.reached, PipelineState::Transcoded);
    assert_eq!(failure.error.kind(), FailureKind::CompileFailure);
    assert_eq!(failure.exit_code(), 1);
    // Transcoding happened before the compile attempt.
    assert_eq!(fx.read_memory_image(), "04030201\n");
}

#[test]
fn test_simulation_failure_reports_compiled_state() {
    let fx = Fixture::new();
    let image = fx.write_image("a.bin", &[1, 2, 3, 4]);
    let mut runner = MockRunner::new();
    expect_stage(&mut runner, Stage::Compile, 0, "");
    expect_stage(&mut runner, Stage::Simulate, 3, "");

    let failure = TestOrchestrator::with_runner(fx.config.clone(), runner)
        .run(&image)
        .unwrap_err();

    assert_eq!(failure.reached, PipelineState::Compiled);
    assert_eq!(failure.error.kind(), FailureKind::SimulationFailure);
}

#[test]
fn test_timeout_is_a_typed_failure() {
    let fx = Fixture::new();
    let image = fx.write_image("a.bin", &[1, 2, 3, 4]);
    let mut runner = MockRunner::new();
    expect_stage(&mut runner, Stage::Compile, 0, "");
    runner
        .expect_run()
        .withf(for_stage(Stage::Simulate))
        .times(1)
        .returning(|req| {
            Err(HarnessError::StageTimeout {
                stage: req.stage,
                program: req.program.clone(),
                timeout: req.timeout,
            })
        });

    let failure = TestOrchestrator::with_runner(fx.config.clone(), runner)
        .run(&image)
        .unwrap_err();

    assert_eq!(failure.reached, PipelineState::Compiled);
    assert_eq!(failure.error.kind(), FailureKind::StageTimeout);
    assert_eq!(failure.exit_code(), 1);
}

#[cfg(unix)]
mod end_to_end {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tbrun_core::sim::{PipelineState, TestOrchestrator};
    use tbrun_core::FailureKind;

    use crate::common::harness::Fixture;

    /// Configures shell-script stand-ins for the compiler and simulator.
    fn with_fake_tools(fx: &mut Fixture, compiler_body: &str) -> std::path::PathBuf {
        let marker = fx.dir.path().join("simulator-ran");
        let compiler = fx.script("fake-iverilog", compiler_body);
        let simulator = fx.script(
            "fake-vvp",
            &format!(
                "touch '{}'\ncat \"$1\"\necho\ncat '{}'",
                marker.display(),
                fx.memory_image().display()
            ),
        );
        fx.config.compiler.program = compiler.to_string_lossy().into_owned();
        fx.config.simulator.program = simulator.to_string_lossy().into_owned();
        marker
    }

    #[test]
    fn test_full_pipeline_with_fake_tools() {
        let mut fx = Fixture::new();
        // "$2" is the artifact path following the output flag.
        let marker = with_fake_tools(&mut fx, "printf 'artifact' > \"$2\"");
        let image = fx.write_image("rv32ui-p-and.bin", &[0x01, 0x02, 0x03, 0x04]);

        let report = TestOrchestrator::new(fx.config.clone()).run(&image).unwrap();

        assert!(marker.exists());
        assert_eq!(fs::read_to_string(fx.config.artifact_path()).unwrap(), "artifact");
        assert_eq!(report.outcome.output(), "artifact\n04030201\n");
    }

    #[test]
    fn test_failing_compiler_never_runs_simulator() {
        let mut fx = Fixture::new();
        let marker = with_fake_tools(&mut fx, "echo 'tb.sv:1: syntax error' >&2\nexit 1");
        let image = fx.write_image("any.bin", &[0xFF; 8]);

        let failure = TestOrchestrator::new(fx.config.clone()).run(&image).unwrap_err();

        assert_eq!(failure.error.kind(), FailureKind::CompileFailure);
        assert_eq!(failure.exit_code(), 1);
        assert_eq!(failure.reached, PipelineState::Transcoded);
        assert_eq!(
            failure.error.invocation().unwrap().stderr,
            "tb.sv:1: syntax error\n"
        );
        assert!(!marker.exists());
    }

    #[test]
    fn test_hanging_compiler_times_out() {
        let mut fx = Fixture::new();
        let marker = with_fake_tools(&mut fx, "sleep 30");
        fx.config.compiler.timeout_ms = 200;
        let image = fx.write_image("any.bin", &[0; 4]);

        let failure = TestOrchestrator::new(fx.config.clone()).run(&image).unwrap_err();

        assert_eq!(failure.error.kind(), FailureKind::StageTimeout);
        assert!(!marker.exists());
    }
}
