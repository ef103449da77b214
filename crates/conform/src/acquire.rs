//! Module acquisition.
//!
//! A module arrives either as a precompiled binary, read verbatim, or as
//! WebAssembly text that is compiled here. The text path always validates the
//! produced binary against the [`FeatureSet`] so that a source using a
//! proposal outside the set is rejected with the validator's diagnostic
//! instead of surfacing later as an engine error.

use crate::features::FeatureSet;
use crate::result::{ConformError, ConformResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Format of a module artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// Binary `.wasm`
    Binary,
    /// Text `.wat`
    Text,
}

impl ModuleFormat {
    /// File extension for this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Binary => "wasm",
            Self::Text => "wat",
        }
    }
}

/// Where a module comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Path of the artifact
    pub path: PathBuf,
    /// Format of the artifact
    pub format: ModuleFormat,
}

impl ModuleSource {
    /// Create a source from an explicit path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: ModuleFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Conventional artifact for a test case: `<dir>/<test>.<ext>`
    #[must_use]
    pub fn for_test(dir: &Path, test_name: &str, format: ModuleFormat) -> Self {
        Self::new(
            dir.join(format!("{test_name}.{}", format.extension())),
            format,
        )
    }
}

/// Binary module bytes, opaque to everything but the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBytes(Vec<u8>);

impl ModuleBytes {
    /// Wrap raw bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the bytes
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

/// Acquire a module from its source
pub async fn acquire(source: &ModuleSource, features: &FeatureSet) -> ConformResult<ModuleBytes> {
    let raw = tokio::fs::read(&source.path)
        .await
        .map_err(|e| ConformError::read(&source.path, e))?;
    match source.format {
        ModuleFormat::Binary => {
            debug!(path = %source.path.display(), bytes = raw.len(), "read binary module");
            Ok(ModuleBytes::new(raw))
        }
        ModuleFormat::Text => {
            let text = String::from_utf8(raw).map_err(|_| ConformError::InvalidUtf8 {
                path: source.path.clone(),
            })?;
            compile_text(&source.path, &text, features)
        }
    }
}

/// Compile WebAssembly text to a binary and validate it against `features`.
///
/// `path` only labels diagnostics.
pub fn compile_text(path: &Path, text: &str, features: &FeatureSet) -> ConformResult<ModuleBytes> {
    let binary = wat::Parser::new()
        .parse_str(Some(path), text)
        .map_err(|e| ConformError::text_compile(e.to_string()))?;
    wasmparser::Validator::new_with_features(features.wasm_features())
        .validate_all(&binary)
        .map_err(|e| ConformError::feature_validation(e.to_string()))?;
    debug!(path = %path.display(), bytes = binary.len(), "compiled text module");
    Ok(ModuleBytes::new(binary))
}

/// Compile a `.wat` file into a `.wasm` file, returning the binary size
pub async fn compile_text_file(
    input: &Path,
    output: &Path,
    features: &FeatureSet,
) -> ConformResult<usize> {
    let source = ModuleSource::new(input, ModuleFormat::Text);
    let bytes = acquire(&source, features).await?;
    let size = bytes.len();
    tokio::fs::write(output, bytes.into_vec())
        .await
        .map_err(|e| ConformError::write(output, e))?;
    Ok(size)
}
