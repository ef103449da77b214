//! Host runtime support imported by compiled programs.
//!
//! Compiler output delegates transcendental math to the host through the
//! `Math` namespace. Every function takes and returns `f64`.

use crate::imports::{HostBinding, HostFunc, ImportObject, ValKind};
use crate::value::WasmValue;

/// Namespace of the math helpers
pub const MATH_NAMESPACE: &str = "Math";

const UNARY: [(&str, fn(f64) -> f64); 15] = [
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("atan", f64::atan),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("cbrt", f64::cbrt),
    ("sinh", f64::sinh),
    ("cosh", f64::cosh),
    ("tanh", f64::tanh),
    ("expm1", f64::exp_m1),
    ("log1p", f64::ln_1p),
];

const BINARY: [(&str, fn(f64, f64) -> f64); 3] = [
    ("atan2", f64::atan2),
    ("pow", pow),
    ("hypot", f64::hypot),
];

/// `Math.pow`: unlike `powf`, a NaN exponent always yields NaN and
/// `(±1) ** ±Infinity` is NaN
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn arg(args: &[WasmValue], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, WasmValue::to_number)
}

/// The `Math` namespace as an import object
#[must_use]
pub fn math_imports() -> ImportObject {
    let mut imports = ImportObject::new();
    for (name, op) in UNARY {
        let func = HostFunc::new([ValKind::F64], [ValKind::F64], move |args| {
            Ok(vec![WasmValue::F64(op(arg(args, 0)))])
        });
        imports.define(MATH_NAMESPACE, name, HostBinding::Func(func));
    }
    for (name, op) in BINARY {
        let func = HostFunc::new([ValKind::F64, ValKind::F64], [ValKind::F64], move |args| {
            Ok(vec![WasmValue::F64(op(arg(args, 0), arg(args, 1)))])
        });
        imports.define(MATH_NAMESPACE, name, HostBinding::Func(func));
    }
    imports
}
