//! Shell host: binary modules, result written through a redirected output
//! stream.
//!
//! The host owns a single output stream, standard output by default.
//! Writing the result redirects that stream to the result file, emits the
//! document with [`ShellHost::putstr`] and restores the previous stream when
//! the [`Redirect`] guard drops, error paths included.

use super::HostAdapter;
use crate::acquire::ModuleBytes;
use crate::config::{HarnessConfig, HostKind};
use crate::imports::ImportObject;
use crate::record::ResultDocument;
use crate::result::{ConformError, ConformResult};
use crate::testdata::TestDataTable;
use async_trait::async_trait;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

type Stream = Box<dyn Write + Send>;

/// Host that writes the result document to its redirected output stream
pub struct ShellHost {
    config: HarnessConfig,
    out: Mutex<Stream>,
}

impl fmt::Debug for ShellHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellHost")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ShellHost {
    /// Create the host for a run, writing to standard output
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_stream(config, Box::new(io::stdout()))
    }

    /// Create the host with a custom output stream
    #[must_use]
    pub fn with_stream(config: HarnessConfig, out: Stream) -> Self {
        Self {
            config,
            out: Mutex::new(out),
        }
    }

    fn stream(&self) -> MutexGuard<'_, Stream> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write text to the current output stream, without a trailing newline
    pub fn putstr(&self, text: &str) -> io::Result<()> {
        let mut out = self.stream();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    /// Send the output stream to `path` until the guard drops
    pub fn redirect(&self, path: &Path) -> ConformResult<Redirect<'_>> {
        let file = File::create(path).map_err(|e| ConformError::write(path, e))?;
        let previous = std::mem::replace(&mut *self.stream(), Box::new(file));
        debug!(path = %path.display(), "output redirected");
        Ok(Redirect {
            host: self,
            previous: Some(previous),
        })
    }
}

/// Restores the previous output stream on drop
pub struct Redirect<'a> {
    host: &'a ShellHost,
    previous: Option<Stream>,
}

impl fmt::Debug for Redirect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redirect").finish_non_exhaustive()
    }
}

impl Drop for Redirect<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let mut out = self.host.stream();
            // The redirected file is closed here; nothing to report a flush error to
            let _ = out.flush();
            *out = previous;
        }
    }
}

#[async_trait]
impl HostAdapter for ShellHost {
    fn kind(&self) -> HostKind {
        HostKind::Shell
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
        {
            let _redirect = self.redirect(&path)?;
            self.putstr(document.as_str())
                .map_err(|e| ConformError::write(&path, e))?;
        }
        info!(path = %path.display(), "result written");
        Ok(path)
    }
}
