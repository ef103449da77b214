//! The fixed WebAssembly feature set.
//!
//! Compiler output under test relies on a handful of post-MVP proposals. The
//! same set drives both the text compiler's validation and the engine's
//! configuration so a module accepted by one is never rejected by the other
//! for feature reasons. Exceptions mean the `try_table`/`exnref` encoding;
//! the legacy `try`/`catch` instructions are rejected at acquisition since the
//! engine cannot run them.

use serde::{Deserialize, Serialize};
use wasmparser::WasmFeatures;

/// Feature flags enabled for text compilation and instantiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureSet {
    /// Non-trapping float-to-int conversions
    pub saturating_float_to_int: bool,
    /// Sign-extension operators
    pub sign_extension: bool,
    /// Exception handling
    pub exceptions: bool,
    /// Reference types
    pub reference_types: bool,
    /// Garbage-collected types (implies typed function references)
    pub gc: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::conformance()
    }
}

impl FeatureSet {
    /// The set compiler output is tested against: every flag enabled
    #[must_use]
    pub const fn conformance() -> Self {
        Self {
            saturating_float_to_int: true,
            sign_extension: true,
            exceptions: true,
            reference_types: true,
            gc: true,
        }
    }

    /// Names and states of all flags, in a stable order
    #[must_use]
    pub const fn flags(&self) -> [(&'static str, bool); 5] {
        [
            ("sat_float_to_int", self.saturating_float_to_int),
            ("sign_extension", self.sign_extension),
            ("exceptions", self.exceptions),
            ("reference_types", self.reference_types),
            ("gc", self.gc),
        ]
    }

    /// Validator features for this set, on top of the MVP baseline
    #[must_use]
    pub fn wasm_features(&self) -> WasmFeatures {
        let mut features = WasmFeatures::WASM1
            | WasmFeatures::MUTABLE_GLOBAL
            | WasmFeatures::MULTI_VALUE
            | WasmFeatures::BULK_MEMORY
            | WasmFeatures::GC_TYPES;
        if self.saturating_float_to_int {
            features |= WasmFeatures::SATURATING_FLOAT_TO_INT;
        }
        if self.sign_extension {
            features |= WasmFeatures::SIGN_EXTENSION;
        }
        if self.exceptions {
            features |= WasmFeatures::EXCEPTIONS;
        }
        if self.reference_types {
            features |= WasmFeatures::REFERENCE_TYPES;
        }
        if self.gc {
            features |= WasmFeatures::GC | WasmFeatures::FUNCTION_REFERENCES;
        }
        features
    }

    /// Engine configuration matching this set.
    ///
    /// Saturating conversions and sign extension are part of the engine's
    /// baseline and cannot be switched off there.
    #[must_use]
    pub fn engine_config(&self) -> wasmtime::Config {
        let mut config = wasmtime::Config::new();
        config
            .wasm_reference_types(self.reference_types)
            .wasm_function_references(self.gc)
            .wasm_gc(self.gc)
            .wasm_exceptions(self.exceptions);
        config
    }
}
