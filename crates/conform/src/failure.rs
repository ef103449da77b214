//! Failure capture for a single export call.
//!
//! Every host formats a thrown error a little differently. The harness uses
//! one canonical composition everywhere:
//!
//! ```text
//! <Name>: <message>
//! <frame>
//! <frame>
//! ```
//!
//! The first line is the error's `toString()`, the rest is the stack, one
//! frame per line, innermost first. An empty stack leaves the trailing
//! newline in place so that the shape of the text never depends on whether
//! frames were available.
//!
//! At most [`MAX_STACK_FRAMES`] frames are kept, the innermost ones, matching
//! the default stack trace limit of the reference hosts.

use std::fmt;
use thiserror::Error;
use wasmtime::{FrameInfo, Trap, WasmBacktrace};

/// Number of innermost frames kept in a captured stack
pub const MAX_STACK_FRAMES: usize = 10;

/// Error class reported in the first line of the failure text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Generic error (host functions, anything unclassified)
    Error,
    /// Lookup or conversion failure at the host boundary
    TypeError,
    /// Resource exhaustion such as stack overflow
    RangeError,
    /// Engine trap
    RuntimeError,
}

impl FailureKind {
    /// Host name of this error class
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::RuntimeError => "RuntimeError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One wasm frame of a captured stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Index of the function in the module's function index space
    pub func_index: u32,
    /// Name from the module's name section, if any
    pub func_name: Option<String>,
    /// Byte offset of the faulting instruction within the module
    pub module_offset: Option<usize>,
}

impl StackFrame {
    fn from_frame(frame: &FrameInfo) -> Self {
        Self {
            func_index: frame.func_index(),
            func_name: frame.func_name().map(str::to_string),
            module_offset: frame.module_offset(),
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@wasm-function[{}]",
            self.func_name.as_deref().unwrap_or_default(),
            self.func_index
        )?;
        if let Some(offset) = self.module_offset {
            write!(f, ":0x{offset:x}")?;
        }
        Ok(())
    }
}

/// A captured failure of one export call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    /// Error class
    pub kind: FailureKind,
    /// Error message
    pub message: String,
    /// Captured wasm stack, innermost first
    pub stack: Vec<StackFrame>,
}

impl Failure {
    /// Create a failure without a stack
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Create a `TypeError` failure
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TypeError, message)
    }

    /// Create a generic `Error` failure
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Error, message)
    }

    /// Attach a stack, keeping the innermost [`MAX_STACK_FRAMES`] frames
    #[must_use]
    pub fn with_stack(mut self, mut stack: Vec<StackFrame>) -> Self {
        stack.truncate(MAX_STACK_FRAMES);
        self.stack = stack;
        self
    }

    /// Classify an error returned by the engine for a call.
    ///
    /// Traps keep their class, failures raised by host bindings keep theirs,
    /// and everything else is reported by its root cause.
    #[must_use]
    pub fn from_engine_error(err: &wasmtime::Error) -> Self {
        let stack = err
            .downcast_ref::<WasmBacktrace>()
            .map(|trace| {
                trace
                    .frames()
                    .iter()
                    .take(MAX_STACK_FRAMES)
                    .map(StackFrame::from_frame)
                    .collect()
            })
            .unwrap_or_default();

        let failure = if let Some(trap) = err.downcast_ref::<Trap>() {
            describe_trap(*trap)
        } else if let Some(raised) = err.downcast_ref::<Self>() {
            raised.clone()
        } else {
            Self::error(err.root_cause().to_string())
        };

        if failure.stack.is_empty() {
            failure.with_stack(stack)
        } else {
            failure
        }
    }

    /// Canonical failure text stored in the result record
    #[must_use]
    pub fn to_text(&self) -> String {
        let frames: Vec<String> = self.stack.iter().map(ToString::to_string).collect();
        format!("{self}\n{}", frames.join("\n"))
    }
}

/// Map an engine trap to the class and message the host reports for it
fn describe_trap(trap: Trap) -> Failure {
    let (kind, message) = match trap {
        Trap::StackOverflow => (FailureKind::RangeError, "Maximum call stack size exceeded"),
        Trap::UnreachableCodeReached => (FailureKind::RuntimeError, "unreachable"),
        Trap::IntegerDivisionByZero => (FailureKind::RuntimeError, "divide by zero"),
        Trap::IntegerOverflow => (FailureKind::RuntimeError, "divide result unrepresentable"),
        Trap::BadConversionToInteger => (
            FailureKind::RuntimeError,
            "float unrepresentable in integer range",
        ),
        Trap::MemoryOutOfBounds => (FailureKind::RuntimeError, "memory access out of bounds"),
        Trap::HeapMisaligned => (
            FailureKind::RuntimeError,
            "operation does not support unaligned accesses",
        ),
        Trap::TableOutOfBounds => (FailureKind::RuntimeError, "table index is out of bounds"),
        Trap::IndirectCallToNull | Trap::BadSignature => (
            FailureKind::RuntimeError,
            "null function or function signature mismatch",
        ),
        Trap::NullReference => (FailureKind::RuntimeError, "dereferencing a null pointer"),
        Trap::ArrayOutOfBounds => (
            FailureKind::RuntimeError,
            "array element access out of bounds",
        ),
        Trap::AllocationTooLarge => (
            FailureKind::RuntimeError,
            "requested new array is too large",
        ),
        Trap::CastFailure => (FailureKind::RuntimeError, "illegal cast"),
        other => return Failure::new(FailureKind::RuntimeError, other.to_string()),
    };
    Failure::new(kind, message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_to_string() {
        let failure = Failure::type_error("exports.missing is not a function");
        assert_eq!(
            failure.to_string(),
            "TypeError: exports.missing is not a function"
        );
    }

    #[test]
    fn test_text_without_stack_keeps_newline() {
        let failure = Failure::error("boom");
        assert_eq!(failure.to_text(), "Error: boom\n");
    }

    #[test]
    fn test_text_with_stack() {
        let failure = Failure::new(FailureKind::RuntimeError, "divide by zero").with_stack(vec![
            StackFrame {
                func_index: 1,
                func_name: Some("div".into()),
                module_offset: Some(0x2a),
            },
            StackFrame {
                func_index: 0,
                func_name: None,
                module_offset: None,
            },
        ]);
        assert_eq!(
            failure.to_text(),
            "RuntimeError: divide by zero\ndiv@wasm-function[1]:0x2a\n@wasm-function[0]"
        );
    }

    #[test]
    fn test_stack_keeps_innermost_frames() {
        let frames = (0..25)
            .map(|i| StackFrame {
                func_index: i,
                func_name: None,
                module_offset: None,
            })
            .collect();
        let failure = Failure::new(FailureKind::RangeError, "too deep").with_stack(frames);
        assert_eq!(failure.stack.len(), MAX_STACK_FRAMES);
        assert_eq!(failure.stack[0].func_index, 0);
        assert_eq!(failure.to_text().lines().count(), 1 + MAX_STACK_FRAMES);
    }

    #[test]
    fn test_trap_classes() {
        assert_eq!(
            describe_trap(Trap::StackOverflow).to_string(),
            "RangeError: Maximum call stack size exceeded"
        );
        assert_eq!(
            describe_trap(Trap::UnreachableCodeReached).to_string(),
            "RuntimeError: unreachable"
        );
        assert_eq!(
            describe_trap(Trap::IntegerDivisionByZero).to_string(),
            "RuntimeError: divide by zero"
        );
    }

    #[test]
    fn test_engine_error_from_host_failure() {
        let err = wasmtime::Error::new(Failure::type_error("exports.f is not wired yet"));
        let failure = Failure::from_engine_error(&err);
        assert_eq!(failure.kind, FailureKind::TypeError);
        assert_eq!(failure.message, "exports.f is not wired yet");
    }

    #[test]
    fn test_engine_error_fallback_uses_root_cause() {
        let err = wasmtime::Error::msg("root cause").context("outer context");
        let failure = Failure::from_engine_error(&err);
        assert_eq!(failure.to_string(), "Error: root cause");
    }
}
