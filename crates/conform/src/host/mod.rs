//! Host adapters.
//!
//! A host decides how the module artifact is read, which base imports the
//! module sees and how the result document reaches disk. The adapter is
//! chosen once per run from [`HostKind`].

mod fs;
mod shell;

pub use fs::FsHost;
pub use shell::{Redirect, ShellHost};

use crate::acquire::{acquire, ModuleBytes};
use crate::config::{HarnessConfig, HostKind};
use crate::imports::ImportObject;
use crate::record::ResultDocument;
use crate::result::{ConformError, ConformResult};
use crate::runtime_support::math_imports;
use crate::testdata::TestDataTable;
use async_trait::async_trait;
use std::path::PathBuf;

/// Host-specific inputs and outputs of a run
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// Which host this is
    fn kind(&self) -> HostKind;

    /// Acquire the module bytes
    async fn read_module(&self) -> ConformResult<ModuleBytes>;

    /// Load the test-data table
    async fn read_test_data(&self) -> ConformResult<TestDataTable>;

    /// Import object the module is linked against, before wiring
    fn base_imports(&self) -> ImportObject;

    /// Persist the result document, returning where it went
    async fn write_result(&self, document: &ResultDocument) -> ConformResult<PathBuf>;
}

/// Create the adapter selected by `config.host`
#[must_use]
pub fn adapter_for(config: &HarnessConfig) -> Box<dyn HostAdapter> {
    match config.host {
        HostKind::Fs => Box::new(FsHost::new(config.clone())),
        HostKind::Shell => Box::new(ShellHost::new(config.clone())),
    }
}

async fn read_module(config: &HarnessConfig) -> ConformResult<ModuleBytes> {
    acquire(&config.module_source(), &config.features).await
}

async fn read_test_data(config: &HarnessConfig) -> ConformResult<TestDataTable> {
    let path = config.test_data_path();
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConformError::read(&path, e))?;
    TestDataTable::from_json_str(&text)
}

fn base_imports(config: &HarnessConfig) -> ImportObject {
    if config.runtime_support {
        math_imports()
    } else {
        ImportObject::new()
    }
}
