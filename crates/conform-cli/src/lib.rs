//! Conform CLI Library
//!
//! Command-line interface for the Conform WebAssembly conformance harness.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{Cli, ColorArg, Commands, HostArg, RunArgs, Wat2WasmArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{format_features, format_summary, Reporter};
