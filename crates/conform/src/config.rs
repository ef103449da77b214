//! Harness Configuration
//!
//! Everything a single harness pass needs to locate its inputs and outputs.

use crate::acquire::{ModuleFormat, ModuleSource};
use crate::features::FeatureSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default test-data file name
pub const DEFAULT_TEST_DATA_FILE: &str = "testdata.json";

/// Default result file name
pub const DEFAULT_RESULT_FILE: &str = "testresult.json";

/// Which host adapter drives the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// Node-style: text module, result written through the file system
    #[default]
    Fs,
    /// Shell-style: binary module, result written through a redirected output
    Shell,
}

impl HostKind {
    /// Module format this host reads unless overridden
    #[must_use]
    pub const fn default_format(self) -> ModuleFormat {
        match self {
            Self::Fs => ModuleFormat::Text,
            Self::Shell => ModuleFormat::Binary,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fs => "fs",
            Self::Shell => "shell",
        }
    }
}

/// Configuration for one harness pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Test case name, the stem of the module artifact
    pub test_name: String,
    /// Directory holding the artifact, test data and result
    pub test_dir: PathBuf,
    /// Host adapter
    pub host: HostKind,
    /// Module format override
    pub format: Option<ModuleFormat>,
    /// Test-data file name inside `test_dir`
    pub test_data_file: String,
    /// Result file name inside `test_dir`
    pub result_file: String,
    /// Provide the runtime-support imports
    pub runtime_support: bool,
    /// Features for text compilation and the engine
    pub features: FeatureSet,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_name: String::new(),
            test_dir: PathBuf::from("."),
            host: HostKind::Fs,
            format: None,
            test_data_file: DEFAULT_TEST_DATA_FILE.to_string(),
            result_file: DEFAULT_RESULT_FILE.to_string(),
            runtime_support: true,
            features: FeatureSet::conformance(),
        }
    }
}

impl HarnessConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Effective module format
    #[must_use]
    pub fn module_format(&self) -> ModuleFormat {
        self.format.unwrap_or_else(|| self.host.default_format())
    }

    /// Where the module artifact lives
    #[must_use]
    pub fn module_source(&self) -> ModuleSource {
        ModuleSource::for_test(&self.test_dir, &self.test_name, self.module_format())
    }

    /// Full test-data path
    #[must_use]
    pub fn test_data_path(&self) -> PathBuf {
        self.test_dir.join(&self.test_data_file)
    }

    /// Full result path
    #[must_use]
    pub fn result_path(&self) -> PathBuf {
        self.test_dir.join(&self.result_file)
    }
}

/// Builder for `HarnessConfig`
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Set the test name
    #[must_use]
    pub fn test_name(mut self, name: impl Into<String>) -> Self {
        self.config.test_name = name.into();
        self
    }

    /// Set the test directory
    #[must_use]
    pub fn test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.test_dir = dir.into();
        self
    }

    /// Set the host adapter
    #[must_use]
    pub fn host(mut self, host: HostKind) -> Self {
        self.config.host = host;
        self
    }

    /// Override the module format
    #[must_use]
    pub fn format(mut self, format: ModuleFormat) -> Self {
        self.config.format = Some(format);
        self
    }

    /// Set the test-data file name
    #[must_use]
    pub fn test_data_file(mut self, name: impl Into<String>) -> Self {
        self.config.test_data_file = name.into();
        self
    }

    /// Set the result file name
    #[must_use]
    pub fn result_file(mut self, name: impl Into<String>) -> Self {
        self.config.result_file = name.into();
        self
    }

    /// Enable/disable the runtime-support imports
    #[must_use]
    pub fn runtime_support(mut self, enabled: bool) -> Self {
        self.config.runtime_support = enabled;
        self
    }

    /// Set the feature set
    #[must_use]
    pub fn features(mut self, features: FeatureSet) -> Self {
        self.config.features = features;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}
