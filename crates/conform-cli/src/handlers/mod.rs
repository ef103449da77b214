//! Command handlers - extracted from main.rs for testability

pub mod features;
pub mod run;
pub mod wat2wasm;

pub use features::execute_features;
pub use run::{execute_run, harness_config};
pub use wat2wasm::execute_wat2wasm;
