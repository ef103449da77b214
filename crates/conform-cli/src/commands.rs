//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use conform::HostKind;
use std::path::PathBuf;

/// Conform: run compiled WebAssembly test cases and record every export's outcome
#[derive(Parser, Debug)]
#[command(name = "conform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one test case and write its result document
    Run(RunArgs),

    /// Compile WebAssembly text to a binary module
    Wat2wasm(Wat2WasmArgs),

    /// Show the enabled WebAssembly feature set
    Features,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test case name (module file stem)
    pub test: String,

    /// Directory containing the module, test data and result
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Host adapter
    #[arg(long, default_value = "fs")]
    pub host: HostArg,

    /// Result file name inside the test directory
    #[arg(long, default_value = conform::DEFAULT_RESULT_FILE)]
    pub result_file: String,

    /// Test-data file name inside the test directory
    #[arg(long, default_value = conform::DEFAULT_TEST_DATA_FILE)]
    pub test_data: String,

    /// Do not provide the runtime-support imports
    #[arg(long)]
    pub no_runtime_support: bool,
}

/// Arguments for the wat2wasm command
#[derive(Parser, Debug)]
pub struct Wat2WasmArgs {
    /// Input `.wat` file
    pub input: PathBuf,

    /// Output file (defaults to the input with a `.wasm` extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Wat2WasmArgs {
    /// Effective output path
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("wasm"))
    }
}

/// Host adapter argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostArg {
    /// Text module, result written through the file system
    #[default]
    Fs,
    /// Binary module, result written through a redirected output stream
    Shell,
}

impl From<HostArg> for HostKind {
    fn from(arg: HostArg) -> Self {
        match arg {
            HostArg::Fs => Self::Fs,
            HostArg::Shell => Self::Shell,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
