//! Engine setup and asynchronous instantiation.

use crate::acquire::ModuleBytes;
use crate::features::FeatureSet;
use crate::imports::{inject_exports, link, HarnessState, ImportObject, WiredInstance};
use crate::result::{ConformError, ConformResult};
use thiserror::Error;
use tracing::debug;
use wasmtime::{Engine, Instance, Linker, Module, Store};

/// Build an engine configured for `features`
pub fn build_engine(features: &FeatureSet) -> ConformResult<Engine> {
    Engine::new(&features.engine_config()).map_err(|e| ConformError::engine(format!("{e:#}")))
}

/// Instantiation did not produce an instance.
///
/// Covers malformed binaries, failed validation, unresolved imports and traps
/// in the start function. This is not a fatal error: the run ends without a
/// result document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Instantiation failed: {reason}")]
pub struct InstantiationError {
    /// Engine diagnostic
    pub reason: String,
}

impl InstantiationError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A freshly created instance that has not been wired yet
#[derive(Debug)]
pub struct Instantiated {
    store: Store<HarnessState>,
    instance: Instance,
}

impl Instantiated {
    /// The import object the instance was linked against
    #[must_use]
    pub fn imports(&self) -> &ImportObject {
        &self.store.data().imports
    }

    /// Inject the instance's exports into its import object
    #[must_use]
    pub fn wire(self) -> WiredInstance {
        inject_exports(self.store, self.instance)
    }
}

/// Compile and instantiate on the current thread
pub fn instantiate_blocking(
    engine: &Engine,
    bytes: &ModuleBytes,
    imports: ImportObject,
) -> Result<Instantiated, InstantiationError> {
    let fail = |e: wasmtime::Error| InstantiationError::new(format!("{e:#}"));
    let module = Module::new(engine, bytes.as_slice()).map_err(fail)?;
    let mut store = Store::new(engine, HarnessState::new(imports));
    let mut linker = Linker::new(engine);
    link(&mut linker, &mut store, &module).map_err(fail)?;
    let instance = linker.instantiate(&mut store, &module).map_err(fail)?;
    debug!(
        exports = module.exports().len(),
        imports = module.imports().len(),
        "module instantiated"
    );
    Ok(Instantiated { store, instance })
}

/// Compile and instantiate on the blocking pool.
///
/// Resolves once the instance exists; the caller must [`Instantiated::wire`]
/// it before invoking anything.
pub async fn instantiate(
    engine: &Engine,
    bytes: ModuleBytes,
    imports: ImportObject,
) -> Result<Instantiated, InstantiationError> {
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || instantiate_blocking(&engine, &bytes, imports))
        .await
        .map_err(|e| InstantiationError::new(format!("instantiation task failed: {e}")))?
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::acquire::compile_text;
    use std::path::Path;

    fn text(wat: &str) -> ModuleBytes {
        compile_text(Path::new("test.wat"), wat, &FeatureSet::default()).unwrap()
    }

    #[test]
    fn test_build_engine_with_conformance_features() {
        assert!(build_engine(&FeatureSet::conformance()).is_ok());
    }

    #[tokio::test]
    async fn test_instantiate_resolves() {
        let engine = build_engine(&FeatureSet::default()).unwrap();
        let bytes = text(r#"(module (func (export "f")))"#);
        let instantiated = instantiate(&engine, bytes, ImportObject::new()).await.unwrap();
        assert!(instantiated.imports().exports().is_none());
        let wired = instantiated.wire();
        assert!(wired.imports().exports().is_some());
    }

    #[tokio::test]
    async fn test_malformed_binary_fails() {
        let engine = build_engine(&FeatureSet::default()).unwrap();
        let err = instantiate(&engine, ModuleBytes::new(b"garbage".to_vec()), ImportObject::new())
            .await
            .unwrap_err();
        assert!(!err.reason.is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_import_fails() {
        let engine = build_engine(&FeatureSet::default()).unwrap();
        let bytes = text(r#"(module (import "env" "missing" (func)))"#);
        let err = instantiate(&engine, bytes, ImportObject::new()).await.unwrap_err();
        assert!(err.reason.contains("missing"));
    }

    #[tokio::test]
    async fn test_start_trap_fails() {
        let engine = build_engine(&FeatureSet::default()).unwrap();
        let bytes = text(r#"(module (func $boom unreachable) (start $boom))"#);
        assert!(instantiate(&engine, bytes, ImportObject::new()).await.is_err());
    }
}
