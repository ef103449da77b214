//! Wat2wasm command handler

use crate::commands::Wat2WasmArgs;
use crate::error::CliResult;
use conform::{compile_text_file, FeatureSet};
use std::path::PathBuf;
use tracing::info;

/// Compile the input text module, returning the output path and binary size
pub async fn execute_wat2wasm(args: &Wat2WasmArgs) -> CliResult<(PathBuf, usize)> {
    let output = args.output_path();
    let size = compile_text_file(&args.input, &output, &FeatureSet::conformance()).await?;
    info!(input = %args.input.display(), output = %output.display(), size, "compiled");
    Ok((output, size))
}
