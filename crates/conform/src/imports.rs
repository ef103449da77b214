//! Import object construction and wiring.
//!
//! The [`ImportObject`] lives inside the engine store for the whole run, so
//! the object the module is linked against is the very object that later
//! receives the instance's own exports.
//!
//! Compiled modules reach back into themselves through imports from the
//! `exports` namespace. Those imports are linked as late-bound trampolines:
//! each call reads `exports` through the import object and forwards to the
//! export of the same name. Before [`inject_exports`] runs, such a call fails
//! with a `TypeError`.

use crate::failure::Failure;
use crate::value::WasmValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use wasmtime::{
    Caller, Engine, ExternType, FuncType, Global, GlobalType, Instance, Linker, Memory,
    MemoryType, Module, Mutability, Ref, RefType, Store, Table, TableType, Val, ValType,
};

/// Namespace that receives the instance's own exports
pub const EXPORTS_NAMESPACE: &str = "exports";

/// Numeric type of a host binding's parameter, result or global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValKind {
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ValKind {
    /// Engine value type
    #[must_use]
    pub const fn val_type(self) -> ValType {
        match self {
            Self::I32 => ValType::I32,
            Self::I64 => ValType::I64,
            Self::F32 => ValType::F32,
            Self::F64 => ValType::F64,
        }
    }

    fn to_val(self, value: &WasmValue) -> Result<Val, Failure> {
        crate::value::to_val(Some(value), &self.val_type())
    }
}

/// Callback behind a host function
pub type HostCallback = dyn Fn(&[WasmValue]) -> Result<Vec<WasmValue>, Failure> + Send + Sync;

/// A host-provided function with a fixed signature
#[derive(Clone)]
pub struct HostFunc {
    params: Vec<ValKind>,
    results: Vec<ValKind>,
    callback: Arc<HostCallback>,
}

impl fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunc")
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

impl HostFunc {
    /// Create a host function
    pub fn new<F>(params: impl Into<Vec<ValKind>>, results: impl Into<Vec<ValKind>>, callback: F) -> Self
    where
        F: Fn(&[WasmValue]) -> Result<Vec<WasmValue>, Failure> + Send + Sync + 'static,
    {
        Self {
            params: params.into(),
            results: results.into(),
            callback: Arc::new(callback),
        }
    }

    /// Parameter types
    #[must_use]
    pub fn params(&self) -> &[ValKind] {
        &self.params
    }

    /// Result types
    #[must_use]
    pub fn results(&self) -> &[ValKind] {
        &self.results
    }

    /// Call the function directly
    pub fn call(&self, args: &[WasmValue]) -> Result<Vec<WasmValue>, Failure> {
        (self.callback)(args)
    }

    fn func_type(&self, engine: &Engine) -> FuncType {
        FuncType::new(
            engine,
            self.params.iter().map(|k| k.val_type()),
            self.results.iter().map(|k| k.val_type()),
        )
    }
}

/// A single host-provided binding
#[derive(Debug, Clone)]
pub enum HostBinding {
    /// Function
    Func(HostFunc),
    /// Linear memory, sizes in pages
    Memory {
        /// Initial size
        minimum: u32,
        /// Optional maximum size
        maximum: Option<u32>,
    },
    /// Function-reference table, sizes in elements
    Table {
        /// Initial size
        minimum: u32,
        /// Optional maximum size
        maximum: Option<u32>,
    },
    /// Global
    Global {
        /// Value type
        kind: ValKind,
        /// Initial value
        value: WasmValue,
        /// Whether the module may write it
        mutable: bool,
    },
}

/// Contents of one import namespace
#[derive(Debug, Clone)]
pub enum Namespace {
    /// Bindings provided by the host
    Host(BTreeMap<String, HostBinding>),
    /// An instance's export mapping, injected after instantiation
    Instance(Instance),
}

/// Namespace name -> binding name -> host value
#[derive(Debug, Clone, Default)]
pub struct ImportObject {
    namespaces: BTreeMap<String, Namespace>,
}

impl ImportObject {
    /// Create an empty import object
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a binding, creating the namespace if needed
    pub fn define(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        binding: HostBinding,
    ) -> &mut Self {
        let entry = self
            .namespaces
            .entry(namespace.into())
            .or_insert_with(|| Namespace::Host(BTreeMap::new()));
        if let Namespace::Instance(_) = entry {
            *entry = Namespace::Host(BTreeMap::new());
        }
        if let Namespace::Host(bindings) = entry {
            bindings.insert(name.into(), binding);
        }
        self
    }

    /// Builder-style [`define`](Self::define)
    #[must_use]
    pub fn with(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        binding: HostBinding,
    ) -> Self {
        self.define(namespace, name, binding);
        self
    }

    /// Look up a namespace
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Look up a host binding
    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<&HostBinding> {
        match self.namespaces.get(namespace)? {
            Namespace::Host(bindings) => bindings.get(name),
            Namespace::Instance(_) => None,
        }
    }

    /// Namespace names in sorted order
    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// The injected export mapping, once wired
    #[must_use]
    pub fn exports(&self) -> Option<Instance> {
        match self.namespaces.get(EXPORTS_NAMESPACE)? {
            Namespace::Instance(instance) => Some(*instance),
            Namespace::Host(_) => None,
        }
    }

    /// Whether no namespace is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    fn host_bindings(&self) -> Vec<(String, String, HostBinding)> {
        self.namespaces
            .iter()
            .filter_map(|(namespace, contents)| match contents {
                Namespace::Host(bindings) => Some((namespace, bindings)),
                Namespace::Instance(_) => None,
            })
            .flat_map(|(namespace, bindings)| {
                bindings
                    .iter()
                    .map(move |(name, binding)| (namespace.clone(), name.clone(), binding.clone()))
            })
            .collect()
    }

    fn set_exports(&mut self, instance: Instance) -> Option<Namespace> {
        self.namespaces
            .insert(EXPORTS_NAMESPACE.to_string(), Namespace::Instance(instance))
    }
}

/// Store data for a run
#[derive(Debug)]
pub struct HarnessState {
    /// The run's import object
    pub imports: ImportObject,
}

impl HarnessState {
    /// Wrap an import object
    #[must_use]
    pub fn new(imports: ImportObject) -> Self {
        Self { imports }
    }
}

/// An instance whose `exports` namespace has been injected.
///
/// Only [`inject_exports`] produces one, which makes "wired before invoked"
/// a type-level property.
#[derive(Debug)]
pub struct WiredInstance {
    store: Store<HarnessState>,
    instance: Instance,
}

impl WiredInstance {
    /// The import object after injection
    #[must_use]
    pub fn imports(&self) -> &ImportObject {
        &self.store.data().imports
    }

    pub(crate) fn into_parts(self) -> (Store<HarnessState>, Instance) {
        (self.store, self.instance)
    }
}

/// Inject the instance's exports into its own import object.
///
/// Precondition: `instance` was created in `store`. Must run before any
/// export is invoked. A host-provided `exports` namespace is replaced.
pub fn inject_exports(mut store: Store<HarnessState>, instance: Instance) -> WiredInstance {
    if let Some(Namespace::Host(previous)) = store.data_mut().imports.set_exports(instance) {
        warn!(
            bindings = previous.len(),
            "host-provided `exports` namespace overwritten by instance exports"
        );
    }
    debug!("instance exports wired into import object");
    WiredInstance { store, instance }
}

/// Define the store's import object in `linker` for instantiating `module`
pub(crate) fn link(
    linker: &mut Linker<HarnessState>,
    store: &mut Store<HarnessState>,
    module: &Module,
) -> wasmtime::Result<()> {
    let engine = store.engine().clone();
    for (namespace, name, binding) in store.data().imports.host_bindings() {
        match binding {
            HostBinding::Func(func) => define_host_func(linker, &engine, &namespace, &name, func)?,
            HostBinding::Memory { minimum, maximum } => {
                let memory = Memory::new(&mut *store, MemoryType::new(minimum, maximum))?;
                linker.define(&*store, &namespace, &name, memory)?;
            }
            HostBinding::Table { minimum, maximum } => {
                let ty = TableType::new(RefType::FUNCREF, minimum, maximum);
                let table = Table::new(&mut *store, ty, Ref::Func(None))?;
                linker.define(&*store, &namespace, &name, table)?;
            }
            HostBinding::Global {
                kind,
                value,
                mutable,
            } => {
                let mutability = if mutable {
                    Mutability::Var
                } else {
                    Mutability::Const
                };
                let init = kind.to_val(&value).map_err(wasmtime::Error::new)?;
                let global = Global::new(&mut *store, GlobalType::new(kind.val_type(), mutability), init)?;
                linker.define(&*store, &namespace, &name, global)?;
            }
        }
    }

    for import in module.imports() {
        if import.module() != EXPORTS_NAMESPACE
            || store.data().imports.get(EXPORTS_NAMESPACE, import.name()).is_some()
        {
            continue;
        }
        match import.ty() {
            ExternType::Func(ty) => define_exports_trampoline(linker, import.name(), ty)?,
            other => {
                return Err(wasmtime::Error::msg(format!(
                    "import `{EXPORTS_NAMESPACE}.{}` must be a function, found {other:?}",
                    import.name()
                )));
            }
        }
    }
    Ok(())
}

fn define_host_func(
    linker: &mut Linker<HarnessState>,
    engine: &Engine,
    namespace: &str,
    name: &str,
    func: HostFunc,
) -> wasmtime::Result<()> {
    let ty = func.func_type(engine);
    linker.func_new(namespace, name, ty, move |_caller, params, results| {
        let args = params
            .iter()
            .map(WasmValue::from_val)
            .collect::<Result<Vec<_>, _>>()
            .map_err(wasmtime::Error::new)?;
        let returned = func.call(&args).map_err(wasmtime::Error::new)?;
        if returned.len() != results.len() {
            return Err(wasmtime::Error::new(Failure::type_error(format!(
                "host function returned {} values, expected {}",
                returned.len(),
                results.len()
            ))));
        }
        for ((slot, value), kind) in results.iter_mut().zip(&returned).zip(func.results()) {
            *slot = kind.to_val(value).map_err(wasmtime::Error::new)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn define_exports_trampoline(
    linker: &mut Linker<HarnessState>,
    name: &str,
    ty: FuncType,
) -> wasmtime::Result<()> {
    let export_name = name.to_string();
    linker.func_new(
        EXPORTS_NAMESPACE,
        name,
        ty,
        move |mut caller: Caller<'_, HarnessState>, params, results| {
            let instance = caller.data().imports.exports().ok_or_else(|| {
                wasmtime::Error::new(Failure::type_error(format!(
                    "{EXPORTS_NAMESPACE}.{export_name} is not wired yet"
                )))
            })?;
            let func = instance.get_func(&mut caller, &export_name).ok_or_else(|| {
                wasmtime::Error::new(Failure::type_error(format!(
                    "{EXPORTS_NAMESPACE}.{export_name} is not a function"
                )))
            })?;
            func.call(&mut caller, params, results)
        },
    )?;
    Ok(())
}
