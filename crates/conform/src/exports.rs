//! Access to an instance's exports by name.

use crate::failure::Failure;
use crate::imports::{HarnessState, WiredInstance};
use crate::value::{placeholder, to_val, WasmValue};
use std::collections::HashMap;
use std::fmt;
use wasmtime::{Extern, Store};

/// Name-indexed callable exports
pub trait ExportMap {
    /// Export names in declaration order
    fn export_names(&self) -> Vec<String>;

    /// Call an export with host-side arguments.
    ///
    /// Missing arguments are `undefined`; extra ones are ignored.
    fn invoke(&mut self, name: &str, args: &[WasmValue]) -> Result<Vec<WasmValue>, Failure>;
}

/// Exports of a wired engine instance
pub struct WasmExports {
    store: Store<HarnessState>,
    names: Vec<String>,
    exports: HashMap<String, Extern>,
}

impl fmt::Debug for WasmExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmExports")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl WasmExports {
    /// Collect the exports of a wired instance
    #[must_use]
    pub fn new(wired: WiredInstance) -> Self {
        let (mut store, instance) = wired.into_parts();
        let collected: Vec<(String, Extern)> = instance
            .exports(&mut store)
            .map(|export| (export.name().to_string(), export.into_extern()))
            .collect();
        let names = collected.iter().map(|(name, _)| name.clone()).collect();
        Self {
            store,
            names,
            exports: collected.into_iter().collect(),
        }
    }
}

impl ExportMap for WasmExports {
    fn export_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn invoke(&mut self, name: &str, args: &[WasmValue]) -> Result<Vec<WasmValue>, Failure> {
        let Some(Extern::Func(func)) = self.exports.get(name).cloned() else {
            return Err(Failure::type_error(format!("exports.{name} is not a function")));
        };
        let ty = func.ty(&self.store);
        let params = ty
            .params()
            .enumerate()
            .map(|(i, param)| to_val(args.get(i), &param))
            .collect::<Result<Vec<_>, _>>()?;
        let mut results: Vec<_> = ty.results().map(|result| placeholder(&result)).collect();
        if let Err(err) = func.call(&mut self.store, &params, &mut results) {
            // An uncaught exception stays rooted in the store until taken
            let _ = self.store.take_pending_exception();
            return Err(Failure::from_engine_error(&err));
        }
        results.iter().map(WasmValue::from_val).collect()
    }
}
