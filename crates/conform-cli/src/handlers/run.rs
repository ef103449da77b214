//! Run command handler

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use conform::{Harness, HarnessConfig, RunOutcome, RunReport};

/// Harness configuration for the run arguments
#[must_use]
pub fn harness_config(args: &RunArgs) -> HarnessConfig {
    HarnessConfig::builder()
        .test_name(&args.test)
        .test_dir(&args.dir)
        .host(args.host.into())
        .result_file(&args.result_file)
        .test_data_file(&args.test_data)
        .runtime_support(!args.no_runtime_support)
        .build()
}

/// Run one harness pass.
///
/// An instantiation failure becomes an error here so the process exits
/// non-zero, even though the library treats it as a normal outcome.
pub async fn execute_run(args: &RunArgs) -> CliResult<RunReport> {
    match Harness::new(harness_config(args)).run().await? {
        RunOutcome::Completed(report) => Ok(report),
        RunOutcome::InstantiationFailed { reason } => Err(CliError::instantiation(reason)),
    }
}
