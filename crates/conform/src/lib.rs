//! Conform: WebAssembly Conformance-Test Harness
//!
//! Runs one compiled test case against a WebAssembly engine and records what
//! every listed export returned, or how it failed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ <test>.wat / │   │ instantiate  │   │ inject own   │   │ testdata.json│
//! │ <test>.wasm  │──►│ (blocking    │──►│ exports into │──►│ -> invoke    │
//! │ + features   │   │  pool)       │   │ import object│   │ -> record    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                 ▼
//!                                                         testresult.json
//! ```
//!
//! Every test-data key yields exactly one result entry: the stringified
//! return value, or `"<Name>: <message>\n<stack>"` when the call failed.

#![warn(missing_docs)]

mod acquire;
mod config;
mod exports;
mod failure;
mod features;
mod harness;
mod host;
mod imports;
mod instance;
mod invoker;
mod record;
mod result;
mod runtime_support;
mod testdata;
mod value;

pub use acquire::{acquire, compile_text, compile_text_file, ModuleBytes, ModuleFormat, ModuleSource};
pub use config::{
    HarnessConfig, HarnessConfigBuilder, HostKind, DEFAULT_RESULT_FILE, DEFAULT_TEST_DATA_FILE,
};
pub use exports::{ExportMap, WasmExports};
pub use failure::{Failure, FailureKind, StackFrame, MAX_STACK_FRAMES};
pub use features::FeatureSet;
pub use harness::{Harness, RunOutcome, RunReport};
pub use host::{adapter_for, FsHost, HostAdapter, Redirect, ShellHost};
pub use imports::{
    inject_exports, HarnessState, HostBinding, HostCallback, HostFunc, ImportObject, Namespace,
    ValKind, WiredInstance, EXPORTS_NAMESPACE,
};
pub use instance::{build_engine, instantiate, instantiate_blocking, Instantiated, InstantiationError};
pub use invoker::invoke_all;
pub use record::{Outcome, ResultDocument, ResultRecord};
pub use result::{ConformError, ConformResult};
pub use runtime_support::{math_imports, MATH_NAMESPACE};
pub use testdata::TestDataTable;
pub use value::{
    number_to_string, string_to_number, stringify_returns, to_int32, to_val, RefValue, WasmValue,
};
