//! File-system host: text modules, result written directly.

use super::HostAdapter;
use crate::acquire::ModuleBytes;
use crate::config::{HarnessConfig, HostKind};
use crate::imports::ImportObject;
use crate::record::ResultDocument;
use crate::result::{ConformError, ConformResult};
use crate::testdata::TestDataTable;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Host that writes the result document with a plain file write
#[derive(Debug, Clone)]
pub struct FsHost {
    config: HarnessConfig,
}

impl FsHost {
    /// Create the host for a run
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl HostAdapter for FsHost {
    fn kind(&self) -> HostKind {
        HostKind::Fs
    }

    async fn read_module(&self) -> ConformResult<ModuleBytes> {
        super::read_module(&self.config).await
    }

    async fn read_test_data(&self) -> ConformResult<TestDataTable> {
        super::read_test_data(&self.config).await
    }

    fn base_imports(&self) -> ImportObject {
        super::base_imports(&self.config)
    }

    async fn write_result(&self, document: &ResultDocument) -> ConformResult<PathBuf> {
        let path = self.config.result_path();
        tokio::fs::write(&path, document.as_bytes())
            .await
            .map_err(|e| ConformError::write(&path, e))?;
        info!(path = %path.display(), "result written");
        Ok(path)
    }
}
