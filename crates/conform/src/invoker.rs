//! Driving the test-data table against an export map.

use crate::exports::ExportMap;
use crate::record::{Outcome, ResultRecord};
use crate::testdata::TestDataTable;
use crate::value::stringify_returns;
use tracing::debug;

/// Invoke every export named in `table`, in table order.
///
/// Every call completes (returns or fails) before the next starts. A failing
/// call never affects the others, and the record has exactly the table's keys.
pub fn invoke_all<M: ExportMap + ?Sized>(exports: &mut M, table: &TestDataTable) -> ResultRecord {
    let mut record = ResultRecord::with_capacity(table.len());
    for (name, args) in table.iter() {
        let outcome = match exports.invoke(name, args) {
            Ok(values) => Outcome::Returned(stringify_returns(&values)),
            Err(failure) => Outcome::Failed(failure.to_text()),
        };
        debug!(export = name, args = args.len(), failed = outcome.is_failure(), "invoked");
        record.insert(name, outcome);
    }
    record
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::failure::{Failure, FailureKind, StackFrame};
    use crate::value::WasmValue;

    /// Records calls and answers from a fixed script
    #[derive(Debug, Default)]
    struct ScriptedExports {
        calls: Vec<String>,
    }

    impl ExportMap for ScriptedExports {
        fn export_names(&self) -> Vec<String> {
            vec!["sum".into(), "trap".into(), "unit".into()]
        }

        fn invoke(&mut self, name: &str, args: &[WasmValue]) -> Result<Vec<WasmValue>, Failure> {
            self.calls.push(name.to_string());
            match name {
                "sum" => Ok(vec![WasmValue::F64(
                    args.iter().map(WasmValue::to_number).sum(),
                )]),
                "trap" => Err(Failure::new(FailureKind::RuntimeError, "unreachable")
                    .with_stack(vec![StackFrame {
                        func_index: 1,
                        func_name: Some("trap".into()),
                        module_offset: Some(0x2a),
                    }])),
                "unit" => Ok(Vec::new()),
                other => Err(Failure::type_error(format!("exports.{other} is not a function"))),
            }
        }
    }

    fn table() -> TestDataTable {
        TestDataTable::new()
            .with_entry("trap", vec![])
            .with_entry("sum", vec![WasmValue::I64(40), WasmValue::I64(2)])
            .with_entry("ghost", vec![])
            .with_entry("unit", vec![])
    }

    #[test]
    fn test_record_has_exactly_table_keys() {
        let record = invoke_all(&mut ScriptedExports::default(), &table());
        let names: Vec<_> = record.names().collect();
        assert_eq!(names, ["trap", "sum", "ghost", "unit"]);
    }

    #[test]
    fn test_calls_follow_table_order() {
        let mut exports = ScriptedExports::default();
        invoke_all(&mut exports, &table());
        assert_eq!(exports.calls, ["trap", "sum", "ghost", "unit"]);
    }

    #[test]
    fn test_failure_does_not_affect_later_calls() {
        let record = invoke_all(&mut ScriptedExports::default(), &table());
        assert_eq!(record.get("sum").unwrap(), &Outcome::Returned("42".into()));
        assert_eq!(
            record.get("trap").unwrap().text(),
            "RuntimeError: unreachable\ntrap@wasm-function[1]:0x2a"
        );
        assert_eq!(
            record.get("ghost").unwrap().text(),
            "TypeError: exports.ghost is not a function\n"
        );
        assert_eq!(record.get("unit").unwrap().text(), "undefined");
        assert_eq!(record.failure_count(), 2);
    }

    #[test]
    fn test_empty_table() {
        let mut exports = ScriptedExports::default();
        let record = invoke_all(&mut exports, &TestDataTable::new());
        assert!(record.is_empty());
        assert!(exports.calls.is_empty());
    }
}
