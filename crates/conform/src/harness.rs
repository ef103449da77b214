//! The harness run: acquire, instantiate, wire, invoke, record.

use crate::config::HarnessConfig;
use crate::exports::WasmExports;
use crate::host::{adapter_for, HostAdapter};
use crate::instance::{build_engine, instantiate};
use crate::invoker::invoke_all;
use crate::record::ResultRecord;
use crate::result::ConformResult;
use std::path::PathBuf;
use tracing::{error, info};

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Where the result document was written
    pub result_path: PathBuf,
    /// Outcomes by export name
    pub record: ResultRecord,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every export was invoked and the result document written
    Completed(RunReport),
    /// The module could not be instantiated; nothing was written
    InstantiationFailed {
        /// Engine diagnostic
        reason: String,
    },
}

impl RunOutcome {
    /// Whether a result document was written
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// One harness pass over one test case
pub struct Harness {
    config: HarnessConfig,
    host: Box<dyn HostAdapter>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("host", &self.host.kind())
            .finish()
    }
}

impl Harness {
    /// Create a harness using the host selected by the configuration
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        let host = adapter_for(&config);
        Self { config, host }
    }

    /// Create a harness with an explicit host adapter
    #[must_use]
    pub fn with_host(config: HarnessConfig, host: Box<dyn HostAdapter>) -> Self {
        Self { config, host }
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the pass.
    ///
    /// Acquisition and test-data errors are fatal and returned as `Err`.
    /// An instantiation failure is logged and reported without writing a
    /// result document. Export failures end up in the record.
    pub async fn run(&self) -> ConformResult<RunOutcome> {
        info!(
            test = %self.config.test_name,
            host = self.host.kind().as_str(),
            "starting harness run"
        );
        let bytes = self.host.read_module().await?;
        let table = self.host.read_test_data().await?;
        let imports = self.host.base_imports();
        let engine = build_engine(&self.config.features)?;

        let instantiated = match instantiate(&engine, bytes, imports).await {
            Ok(instantiated) => instantiated,
            Err(err) => {
                error!(test = %self.config.test_name, reason = %err.reason, "instantiation failed");
                return Ok(RunOutcome::InstantiationFailed { reason: err.reason });
            }
        };

        let mut exports = WasmExports::new(instantiated.wire());
        let record = invoke_all(&mut exports, &table);
        let document = record.to_document()?;
        let result_path = self.host.write_result(&document).await?;
        info!(
            entries = record.len(),
            failures = record.failure_count(),
            "harness run complete"
        );
        Ok(RunOutcome::Completed(RunReport {
            result_path,
            record,
        }))
    }
}
