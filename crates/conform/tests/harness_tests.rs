//! End-to-end harness runs against real modules on disk.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use conform::{
    compile_text, ConformError, FeatureSet, Harness, HarnessConfig, HostKind, RunOutcome,
    RunReport, MAX_STACK_FRAMES,
};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

const ARITH_WAT: &str = r#"(module
  (func $answer (export "answer") (result i32)
    i32.const 42)
  (func $divide (export "divide") (param i32 i32) (result i32)
    local.get 0
    local.get 1
    i32.div_s)
  (func $nan (export "nan") (result f64)
    f64.const nan)
  (func $tenth (export "tenth") (result f32)
    f32.const 0.1)
  (func $big (export "big") (param i64) (result i64)
    local.get 0
    i64.const 1
    i64.add)
  (func $nothing (export "nothing"))
  (func $boom (export "boom") (result i32)
    unreachable))"#;

const ARITH_DATA: &str = r#"{
  "answer": [],
  "divide": [6, 3],
  "divideByZero": [1, 0],
  "nan": [],
  "tenth": [],
  "big": ["9007199254740992"],
  "nothing": [],
  "boom": []
}"#;

fn case(dir: &Path, name: &str, wat: &str, data: &str) {
    fs::write(dir.join(format!("{name}.wat")), wat).unwrap();
    fs::write(dir.join("testdata.json"), data).unwrap();
}

fn binary_case(dir: &Path, name: &str, wat: &str, data: &str) {
    let bytes = compile_text(Path::new("fixture.wat"), wat, &FeatureSet::default()).unwrap();
    fs::write(dir.join(format!("{name}.wasm")), bytes.as_slice()).unwrap();
    fs::write(dir.join("testdata.json"), data).unwrap();
}

fn config(dir: &Path, name: &str) -> HarnessConfig {
    HarnessConfig::builder().test_name(name).test_dir(dir).build()
}

async fn completed(config: HarnessConfig) -> RunReport {
    match Harness::new(config).run().await.unwrap() {
        RunOutcome::Completed(report) => report,
        RunOutcome::InstantiationFailed { reason } => panic!("instantiation failed: {reason}"),
    }
}

fn result_json(dir: &Path) -> serde_json::Map<String, Value> {
    let text = fs::read_to_string(dir.join("testresult.json")).unwrap();
    match serde_json::from_str(&text).unwrap() {
        Value::Object(map) => map,
        other => panic!("result is not an object: {other}"),
    }
}

fn entry<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap()
}

// ============================================================================
// Record shape
// ============================================================================

#[tokio::test]
async fn test_one_entry_per_test_data_key_in_order() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, ARITH_DATA);
    let report = completed(config(dir.path(), "arith")).await;

    let expected = [
        "answer",
        "divide",
        "divideByZero",
        "nan",
        "tenth",
        "big",
        "nothing",
        "boom",
    ];
    let names: Vec<_> = report.record.names().collect();
    assert_eq!(names, expected);
    let on_disk: Vec<_> = result_json(dir.path()).keys().cloned().collect();
    assert_eq!(on_disk, expected);
    assert_eq!(report.result_path, dir.path().join("testresult.json"));
}

#[tokio::test]
async fn test_stringified_returns() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, ARITH_DATA);
    completed(config(dir.path(), "arith")).await;

    let results = result_json(dir.path());
    assert_eq!(entry(&results, "answer"), "42");
    assert_eq!(entry(&results, "divide"), "2");
    assert_eq!(entry(&results, "nan"), "NaN");
    assert_eq!(entry(&results, "tenth"), "0.10000000149011612");
    assert_eq!(entry(&results, "big"), "9007199254740993");
    assert_eq!(entry(&results, "nothing"), "undefined");
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, ARITH_DATA);
    let report = completed(config(dir.path(), "arith")).await;

    let results = result_json(dir.path());
    let divide_by_zero = entry(&results, "divideByZero");
    assert!(divide_by_zero.starts_with("RuntimeError: divide by zero\n"));
    assert!(divide_by_zero.contains("wasm-function["));
    assert!(entry(&results, "boom").starts_with("RuntimeError: unreachable\n"));
    assert_eq!(entry(&results, "answer"), "42");
    assert_eq!(report.record.failure_count(), 2);
}

const RECURSE_WAT: &str = r#"(module
  (func $recurse (export "recurse") (param i32) (result i32)
    local.get 0
    call $recurse)
  (func (export "ok") (result i32)
    i32.const 3))"#;

#[tokio::test]
async fn test_stack_overflow_keeps_innermost_frames() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "recurse", RECURSE_WAT, r#"{"recurse": [1], "ok": []}"#);
    completed(config(dir.path(), "recurse")).await;

    let results = result_json(dir.path());
    let overflow = entry(&results, "recurse");
    assert!(overflow.starts_with("RangeError: Maximum call stack size exceeded\n"));
    let frames: Vec<_> = overflow.lines().skip(1).collect();
    assert_eq!(frames.len(), MAX_STACK_FRAMES);
    assert!(frames.iter().all(|frame| frame.starts_with("recurse@wasm-function[0]")));
    assert_eq!(entry(&results, "ok"), "3");
}

const THROW_WAT: &str = r#"(module
  (tag $oops (param i32))
  (func (export "first") (result i32)
    i32.const 1
    throw $oops)
  (func (export "ok") (result i32)
    i32.const 1)
  (func (export "second") (result i32)
    i32.const 2
    throw $oops))"#;

#[tokio::test]
async fn test_uncaught_exceptions_are_isolated() {
    let dir = TempDir::new().unwrap();
    case(
        dir.path(),
        "throw",
        THROW_WAT,
        r#"{"first": [], "ok": [], "second": []}"#,
    );
    let report = completed(config(dir.path(), "throw")).await;

    let results = result_json(dir.path());
    for name in ["first", "second"] {
        let text = entry(&results, name);
        assert!(text.starts_with("Error: thrown Wasm exception\n"), "{name}: {text}");
    }
    assert_eq!(entry(&results, "ok"), "1");
    assert_eq!(report.record.failure_count(), 2);
}

#[tokio::test]
async fn test_missing_export_is_type_error() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, r#"{"ghost": [], "answer": []}"#);
    completed(config(dir.path(), "arith")).await;

    let results = result_json(dir.path());
    assert_eq!(
        entry(&results, "ghost"),
        "TypeError: exports.ghost is not a function\n"
    );
    assert_eq!(entry(&results, "answer"), "42");
}

#[tokio::test]
async fn test_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, ARITH_DATA);
    completed(config(dir.path(), "arith")).await;
    let first = fs::read(dir.path().join("testresult.json")).unwrap();
    completed(config(dir.path(), "arith")).await;
    let second = fs::read(dir.path().join("testresult.json")).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Import wiring
// ============================================================================

#[tokio::test]
async fn test_self_reference_through_exports_namespace() {
    let wat = r#"(module
      (import "exports" "square" (func $square (param i32) (result i32)))
      (func (export "square") (param i32) (result i32)
        local.get 0
        local.get 0
        i32.mul)
      (func (export "squarePlusOne") (param i32) (result i32)
        local.get 0
        call $square
        i32.const 1
        i32.add))"#;
    let dir = TempDir::new().unwrap();
    case(dir.path(), "selfref", wat, r#"{"squarePlusOne": [7], "square": [3]}"#);
    completed(config(dir.path(), "selfref")).await;

    let results = result_json(dir.path());
    assert_eq!(entry(&results, "squarePlusOne"), "50");
    assert_eq!(entry(&results, "square"), "9");
}

#[tokio::test]
async fn test_runtime_support_math() {
    let wat = r#"(module
      (import "Math" "pow" (func $pow (param f64 f64) (result f64)))
      (func (export "kilo") (result f64)
        f64.const 2
        f64.const 10
        call $pow))"#;
    let dir = TempDir::new().unwrap();
    case(dir.path(), "math", wat, r#"{"kilo": []}"#);
    completed(config(dir.path(), "math")).await;
    assert_eq!(entry(&result_json(dir.path()), "kilo"), "1024");
}

#[tokio::test]
async fn test_runtime_support_can_be_disabled() {
    let wat = r#"(module
      (import "Math" "pow" (func (param f64 f64) (result f64))))"#;
    let dir = TempDir::new().unwrap();
    case(dir.path(), "math", wat, "{}");
    let config = HarnessConfig::builder()
        .test_name("math")
        .test_dir(dir.path())
        .runtime_support(false)
        .build();
    let outcome = Harness::new(config).run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::InstantiationFailed { .. }));
    assert!(!dir.path().join("testresult.json").exists());
}

// ============================================================================
// Shell host
// ============================================================================

#[tokio::test]
async fn test_shell_host_reads_binary_and_writes_result() {
    let dir = TempDir::new().unwrap();
    binary_case(dir.path(), "arith", ARITH_WAT, r#"{"answer": [], "divide": [9, 3]}"#);
    let config = HarnessConfig::builder()
        .test_name("arith")
        .test_dir(dir.path())
        .host(HostKind::Shell)
        .build();
    completed(config).await;
    assert_eq!(
        fs::read_to_string(dir.path().join("testresult.json")).unwrap(),
        r#"{"answer":"42","divide":"3"}"#
    );
}

#[tokio::test]
async fn test_custom_result_file_name() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "arith", ARITH_WAT, r#"{"answer": []}"#);
    let config = HarnessConfig::builder()
        .test_name("arith")
        .test_dir(dir.path())
        .result_file("out.json")
        .build();
    let report = completed(config).await;
    assert_eq!(report.result_path, dir.path().join("out.json"));
    assert!(!dir.path().join("testresult.json").exists());
}

// ============================================================================
// Fatal paths
// ============================================================================

#[tokio::test]
async fn test_malformed_binary_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.wasm"), b"\0asm\x02\0\0\0garbage").unwrap();
    fs::write(dir.path().join("testdata.json"), r#"{"f": []}"#).unwrap();
    let config = HarnessConfig::builder()
        .test_name("broken")
        .test_dir(dir.path())
        .host(HostKind::Shell)
        .build();

    let outcome = Harness::new(config).run().await.unwrap();
    let RunOutcome::InstantiationFailed { reason } = outcome else {
        panic!("expected instantiation failure");
    };
    assert!(!reason.is_empty());
    assert!(!dir.path().join("testresult.json").exists());
}

#[tokio::test]
async fn test_text_compile_error_is_fatal() {
    let dir = TempDir::new().unwrap();
    case(dir.path(), "bad", "(module (func $f (result i32) i32.const))", "{}");
    let err = Harness::new(config(dir.path(), "bad")).run().await.unwrap_err();
    assert!(matches!(err, ConformError::TextCompile { .. }));
    assert!(!dir.path().join("testresult.json").exists());
}

#[tokio::test]
async fn test_missing_module_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("testdata.json"), "{}").unwrap();
    let err = Harness::new(config(dir.path(), "absent")).run().await.unwrap_err();
    assert!(matches!(err, ConformError::Read { .. }));
}

#[tokio::test]
async fn test_missing_test_data_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("arith.wat"), ARITH_WAT).unwrap();
    let err = Harness::new(config(dir.path(), "arith")).run().await.unwrap_err();
    assert!(matches!(err, ConformError::Read { .. }));
    assert!(!dir.path().join("testresult.json").exists());
}
