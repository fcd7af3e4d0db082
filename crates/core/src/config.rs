//! Configuration system for the testbench runner.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** The Icarus Verilog toolchain, its time limits, and the artifact layout.
//! 2. **Structures:** Hierarchical config for layout, compiler, simulator, and source manifest.
//! 3. **Resolution:** Turning relative paths into concrete locations under the project root.
//!
//! Configuration is supplied as JSON (every field optional) or use `HarnessConfig::default()`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::common::HarnessError;

/// Default configuration constants for the runner.
mod defaults {
    /// Root of the design repository; manifest and memory-image paths resolve against it.
    pub const PROJECT_ROOT: &str = ".";

    /// Memory image read by the testbench's `$readmemh`.
    pub const MEMORY_IMAGE: &str = "sim/testcases/generated/inst_data.txt";

    /// Directory the compiled artifact is written to.
    pub const WORK_DIR: &str = ".";

    /// Compiled simulation executable produced by the compile stage.
    pub const ARTIFACT: &str = "out.vvp";

    /// HDL compiler.
    pub const COMPILER: &str = "iverilog";

    /// Compiler flag introducing the output artifact path.
    pub const OUTPUT_FLAG: &str = "-o";

    /// Compiler flag introducing an include directory.
    pub const INCLUDE_FLAG: &str = "-I";

    /// Include directories holding shared `define` headers.
    pub const INCLUDE_DIRS: &[&str] = &["rtl/core/common"];

    /// Compile stage limit (5 s).
    pub const COMPILE_TIMEOUT_MS: u64 = 5_000;

    /// Runner for the compiled artifact.
    pub const SIMULATOR: &str = "vvp";

    /// Simulate stage limit (10 s).
    pub const SIMULATE_TIMEOUT_MS: u64 = 10_000;

    /// Testbench top, compiled first.
    pub const TESTBENCH: &str = "sim/testcases/tb.sv";

    /// Design sources in instantiation dependency order: leaves first, SoC top last.
    pub const SOURCES: &[&str] = &[
        "rtl/core/common/defines.sv",
        "rtl/utils/dff_set.sv",
        "rtl/utils/dff_set_hold.sv",
        "rtl/perips/TIMER.sv",
        "rtl/perips/UART.sv",
        "rtl/perips/GPIO.sv",
        "rtl/perips/SPI.sv",
        "rtl/bus/rib.sv",
        "rtl/perips/RAM.sv",
        "rtl/perips/ROM.sv",
        "rtl/core/clint/csr_reg.sv",
        "rtl/core/clint/clint.sv",
        "rtl/core/common/control.sv",
        "rtl/core/fetch/pc_reg.sv",
        "rtl/core/fetch/if.sv",
        "rtl/core/fetch/if_id.sv",
        "rtl/core/decode/id.sv",
        "rtl/core/decode/id_ex.sv",
        "rtl/core/decode/regs.sv",
        "rtl/core/execute/ex.sv",
        "rtl/core/execute/ex_mem.sv",
        "rtl/core/memory/mem.sv",
        "rtl/core/memory/mem_wb.sv",
        "rtl/core/writeback/wb.sv",
        "rtl/core/top/cpu_top.sv",
        "rtl/cpu_top_soc.sv",
    ];
}

/// Root configuration structure containing all runner settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use tbrun_core::config::HarnessConfig;
///
/// let config = HarnessConfig::default();
/// assert_eq!(config.compiler.program, "iverilog");
/// assert_eq!(config.simulator.timeout_ms, 10_000);
/// ```
///
/// Deserializing a partial document; omitted fields keep their defaults:
///
/// ```
/// use tbrun_core::config::HarnessConfig;
///
/// let json = r#"{
///     "compiler": { "program": "/opt/iverilog/bin/iverilog", "extra_args": ["-g2012"] },
///     "manifest": { "testbench": "tb/top_tb.sv", "sources": ["rtl/top.sv"] }
/// }"#;
///
/// let config = HarnessConfig::from_json_str(json).unwrap();
/// assert_eq!(config.compiler.extra_args, vec!["-g2012".to_string()]);
/// assert_eq!(config.compiler.output_flag, "-o");
/// assert_eq!(config.manifest.sources.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Where inputs live and where generated files are written.
    pub layout: LayoutConfig,
    /// HDL compiler invocation.
    pub compiler: CompilerConfig,
    /// Simulation executable runner invocation.
    pub simulator: SimulatorConfig,
    /// Ordered design and testbench sources.
    pub manifest: SourceManifest,
}

impl HarnessConfig {
    /// Parses a JSON configuration document held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the document is not valid JSON for this structure.
    pub fn from_json_str(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json).map_err(|source| HarnessError::Config {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if the file cannot be read and [`HarnessError::Config`] if
    /// its contents do not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| HarnessError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns this configuration with a different project root.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.layout.project_root = root.into();
        self
    }

    /// Location the memory image is written to.
    pub fn memory_image_path(&self) -> PathBuf {
        self.layout.project_root.join(&self.layout.memory_image)
    }

    /// Location of the compiled simulation artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.layout.work_dir.join(&self.layout.artifact)
    }
}

/// Filesystem layout of a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Root of the design repository.
    pub project_root: PathBuf,
    /// Memory image path, relative to `project_root` unless absolute.
    pub memory_image: PathBuf,
    /// Working directory for both tool invocations.
    pub work_dir: PathBuf,
    /// Compiled artifact name, relative to `work_dir` unless absolute.
    pub artifact: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from(defaults::PROJECT_ROOT),
            memory_image: PathBuf::from(defaults::MEMORY_IMAGE),
            work_dir: PathBuf::from(defaults::WORK_DIR),
            artifact: PathBuf::from(defaults::ARTIFACT),
        }
    }
}

/// HDL compiler settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program name or path.
    pub program: String,
    /// Flag preceding the output artifact path.
    pub output_flag: String,
    /// Flag preceding each include directory.
    pub include_flag: String,
    /// Include directories, relative to the project root unless absolute.
    pub include_dirs: Vec<PathBuf>,
    /// Additional flags placed after the include directories.
    pub extra_args: Vec<String>,
    /// Wall-clock limit for one compile, in milliseconds.
    pub timeout_ms: u64,
}

impl CompilerConfig {
    /// Compile stage limit.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: defaults::COMPILER.to_string(),
            output_flag: defaults::OUTPUT_FLAG.to_string(),
            include_flag: defaults::INCLUDE_FLAG.to_string(),
            include_dirs: defaults::INCLUDE_DIRS.iter().map(PathBuf::from).collect(),
            extra_args: Vec::new(),
            timeout_ms: defaults::COMPILE_TIMEOUT_MS,
        }
    }
}

/// Simulation runner settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Program name or path.
    pub program: String,
    /// Additional arguments placed after the artifact path (e.g. `+plusargs`).
    pub extra_args: Vec<String>,
    /// Wall-clock limit for one simulation, in milliseconds.
    pub timeout_ms: u64,
}

impl SimulatorConfig {
    /// Simulate stage limit.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            program: defaults::SIMULATOR.to_string(),
            extra_args: Vec::new(),
            timeout_ms: defaults::SIMULATE_TIMEOUT_MS,
        }
    }
}

/// Ordered list of sources needed to build one simulation artifact.
///
/// The testbench is always passed to the compiler first, followed by `sources` in the order
/// given. The order reflects module instantiation dependencies and is never rearranged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceManifest {
    /// Testbench top-level file.
    pub testbench: PathBuf,
    /// Design sources, leaves first, top level last.
    pub sources: Vec<PathBuf>,
}

impl SourceManifest {
    /// Returns every manifest path, testbench first, joined onto `root` when relative.
    pub fn resolve(&self, root: &Path) -> Vec<PathBuf> {
        std::iter::once(&self.testbench)
            .chain(&self.sources)
            .map(|p| root.join(p))
            .collect()
    }
}

impl Default for SourceManifest {
    fn default() -> Self {
        Self {
            testbench: PathBuf::from(defaults::TESTBENCH),
            sources: defaults::SOURCES.iter().map(PathBuf::from).collect(),
        }
    }
}
