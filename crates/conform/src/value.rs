//! Heterogeneous argument and return values.
//!
//! Test data arrives as JSON and results leave as strings. In between, values
//! cross the engine boundary where every parameter has a concrete wasm type.
//! [`WasmValue`] is the closed set of values the harness deals with, and the
//! functions here implement the host (JavaScript) conventions for moving
//! between the three worlds:
//!
//! - JSON -> [`WasmValue`] when the test data is loaded,
//! - [`WasmValue`] -> engine value, using `ToInt32` / `ToNumber` / `ToBigInt`
//!   style coercion against the parameter type,
//! - engine value -> [`WasmValue`] -> string, matching `String(x)`.

use crate::failure::Failure;
use serde_json::Value as JsonValue;
use std::fmt;
use wasmtime::{HeapType, RefType, Val, ValType};

/// Message used whenever a value cannot cross the host boundary at all
pub(crate) const TYPE_INCOMPATIBILITY: &str = "type incompatibility when transforming from/to JS";

/// A value passed to or returned from an export
#[derive(Debug, Clone, PartialEq)]
pub enum WasmValue {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer (also used for integral JSON numbers)
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float (also used for non-integral JSON numbers)
    F64(f64),
    /// Boolean (test data only)
    Bool(bool),
    /// String (test data only)
    Str(String),
    /// Null, or a null reference
    Null,
    /// A non-null reference
    Ref(RefValue),
}

/// Kind of a non-null reference returned by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefValue {
    /// Function reference
    Func,
    /// External (host) reference
    Extern,
    /// Internal (GC) reference
    Any,
    /// Any other reference kind the engine produces
    Other,
}

impl WasmValue {
    /// Convert a JSON test-data argument.
    ///
    /// Returns `None` for arrays and objects, which are not valid arguments.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::F64(n.as_f64().unwrap_or(f64::NAN)), Self::I64),
            ),
            JsonValue::String(s) => Some(Self::Str(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Convert an engine value returned by a call.
    pub fn from_val(val: &Val) -> Result<Self, Failure> {
        let value = match val {
            Val::I32(v) => Self::I32(*v),
            Val::I64(v) => Self::I64(*v),
            Val::F32(bits) => Self::F32(f32::from_bits(*bits)),
            Val::F64(bits) => Self::F64(f64::from_bits(*bits)),
            Val::V128(_) => return Err(Failure::type_error(TYPE_INCOMPATIBILITY)),
            Val::FuncRef(func) => func.as_ref().map_or(Self::Null, |_| Self::Ref(RefValue::Func)),
            Val::ExternRef(r) => r.as_ref().map_or(Self::Null, |_| Self::Ref(RefValue::Extern)),
            Val::AnyRef(r) => r.as_ref().map_or(Self::Null, |_| Self::Ref(RefValue::Any)),
            #[allow(unreachable_patterns)]
            other => match other.clone().ref_() {
                Some(r) if !r.is_null() => Self::Ref(RefValue::Other),
                _ => Self::Null,
            },
        };
        Ok(value)
    }

    /// `ToNumber` of this value
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::I32(v) => f64::from(*v),
            Self::I64(v) => *v as f64,
            Self::F32(v) => f64::from(*v),
            Self::F64(v) => *v,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Str(s) => string_to_number(s),
            Self::Null => 0.0,
            Self::Ref(_) => f64::NAN,
        }
    }

    /// `ToBigInt` of this value, accepting integral numbers as well
    fn to_bigint(&self) -> Result<i64, Failure> {
        match self {
            Self::I32(v) => Ok(i64::from(*v)),
            Self::I64(v) => Ok(*v),
            Self::F32(_) | Self::F64(_) => {
                let n = self.to_number();
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_223_372_036_854_775_808.0 {
                    Ok(n as i64)
                } else {
                    Err(Failure::type_error(format!(
                        "Cannot convert {} to a BigInt",
                        number_to_string(n)
                    )))
                }
            }
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0);
                }
                trimmed.parse::<i64>().map_err(|_| {
                    Failure::type_error(format!("Cannot convert {trimmed} to a BigInt"))
                })
            }
            Self::Null => Err(Failure::type_error("Cannot convert null to a BigInt")),
            Self::Ref(_) => Err(Failure::type_error(TYPE_INCOMPATIBILITY)),
        }
    }
}

/// Host string form, as `String(x)` renders it
impl fmt::Display for WasmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => f.write_str(&number_to_string(f64::from(*v))),
            Self::F64(v) => f.write_str(&number_to_string(*v)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
            Self::Ref(RefValue::Func) => f.write_str("function() { [native code] }"),
            Self::Ref(_) => f.write_str("[object Object]"),
        }
    }
}

/// Stringify the values returned by one call.
///
/// No result renders as `undefined`; several results form an array, which
/// joins its elements with `,` and renders null elements as empty strings.
#[must_use]
pub fn stringify_returns(values: &[WasmValue]) -> String {
    match values {
        [] => "undefined".to_string(),
        [single] => single.to_string(),
        many => many
            .iter()
            .map(|v| match v {
                WasmValue::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Coerce an argument to a parameter type.
///
/// `None` stands for a missing argument (`undefined`).
pub fn to_val(arg: Option<&WasmValue>, ty: &ValType) -> Result<Val, Failure> {
    let number = || arg.map_or(f64::NAN, WasmValue::to_number);
    match ty {
        ValType::I32 => Ok(Val::I32(to_int32(number()))),
        ValType::I64 => match arg {
            Some(value) => value.to_bigint().map(Val::I64),
            None => Err(Failure::type_error("Cannot convert undefined to a BigInt")),
        },
        ValType::F32 => Ok(Val::F32((number() as f32).to_bits())),
        ValType::F64 => Ok(Val::F64(number().to_bits())),
        ValType::V128 => Err(Failure::type_error(TYPE_INCOMPATIBILITY)),
        ValType::Ref(ref_ty) => match arg {
            Some(WasmValue::Null) if ref_ty.is_nullable() => Ok(null_ref(ref_ty)),
            _ => Err(Failure::type_error(TYPE_INCOMPATIBILITY)),
        },
    }
}

/// Slot value for a result of the given type, overwritten by the call
pub(crate) fn placeholder(ty: &ValType) -> Val {
    match ty {
        ValType::I32 => Val::I32(0),
        ValType::I64 => Val::I64(0),
        ValType::F32 => Val::F32(0),
        ValType::F64 => Val::F64(0),
        ValType::V128 => Val::V128(0u128.into()),
        ValType::Ref(ref_ty) => null_ref(ref_ty),
    }
}

fn null_ref(ty: &RefType) -> Val {
    match ty.heap_type().top() {
        HeapType::Func => Val::null_func_ref(),
        HeapType::Extern => Val::null_extern_ref(),
        _ => Val::null_any_ref(),
    }
}

/// `ToInt32`: truncate, wrap modulo 2^32, NaN and infinities become 0
#[must_use]
pub fn to_int32(number: f64) -> i32 {
    if !number.is_finite() {
        return 0;
    }
    let wrapped = number.trunc().rem_euclid(4_294_967_296.0);
    if wrapped >= 2_147_483_648.0 {
        (wrapped - 4_294_967_296.0) as i32
    } else {
        wrapped as i32
    }
}

/// `ToNumber` applied to a string
#[must_use]
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return radix_to_number(digits, radix);
        }
    }
    // Rust also accepts "inf" and "nan", which the host does not
    let numeric = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if numeric {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Digits of a prefixed integer literal, accumulated in `f64` so that
/// literals wider than 64 bits stay finite
fn radix_to_number(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc.mul_add(f64::from(radix), f64::from(d)))
        })
        .unwrap_or(f64::NAN)
}

/// Number-to-String as the host defines it.
///
/// Uses the shortest round-trip digits and switches to exponent form when
/// the decimal exponent is at least 21 or below -6.
#[must_use]
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{e_sign}{}", e.abs())
        } else {
            format!("{lead}.{rest}e{e_sign}{}", e.abs())
        }
    };
    format!("{sign}{body}")
}
