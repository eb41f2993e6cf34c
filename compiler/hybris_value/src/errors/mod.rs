//! Error types for evaluation.
//!
//! # Taxonomy
//!
//! Every [`EvalErrorKind`] belongs to one [`ErrorCategory`]:
//!
//! - `Syntax`: invalid program structure found while evaluating (arity,
//!   undeclared names, duplicate declarations, access violations, missing
//!   operator overloads).
//! - `Generic`: operational failures (recursion limit, bad index, missing
//!   map key, thread and extern failures).
//! - `Type`: operand kinds that do not fit the operation.
//! - `Unsupported`: a kind that does not implement the requested operation.
//! - `Exception`: a script `throw` that reached the top level uncaught.
//!
//! Only script `throw` travels through frame state and can be caught. Every
//! `EvalError` is fatal to the run. Factory functions (e.g.
//! [`division_by_zero`]) are the public way to build errors; they populate
//! both `kind` and `message`.

use std::fmt;

use hybris_ir::{Access, Span};

/// Result of an operation that produces a value of type `T`.
pub type EvalResult<T> = Result<T, EvalError>;

/// Error category, used by the driver for reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Generic,
    Type,
    Unsupported,
    Exception,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "syntax error",
            ErrorCategory::Generic => "error",
            ErrorCategory::Type => "type error",
            ErrorCategory::Unsupported => "unsupported operation",
            ErrorCategory::Exception => "unhandled exception",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Syntax
    UndeclaredIdentifier {
        name: String,
    },
    MeOutsideInstance,
    UndeclaredFunction {
        name: String,
    },
    UndeclaredType {
        name: String,
    },
    DuplicateFunction {
        name: String,
    },
    DuplicateType {
        name: String,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        variadic: bool,
        got: usize,
    },
    IllegalAccess {
        type_name: String,
        member: String,
        access: Access,
    },
    UndefinedAttribute {
        type_name: String,
        attribute: String,
    },
    UndefinedMethod {
        type_name: String,
        method: String,
    },
    MissingOverload {
        type_name: String,
        op: String,
    },
    TooManyInitializers {
        type_name: String,
        expected: usize,
        got: usize,
    },
    InvalidAssignment {
        target: String,
    },
    NotCallable {
        type_name: String,
    },

    // Generic
    RecursionLimit {
        limit: usize,
    },
    DivisionByZero,
    IndexOutOfBounds {
        index: i64,
        size: usize,
    },
    NoMappedValue {
        key: String,
    },
    ConstantModification,
    Thread {
        message: String,
    },
    Extern {
        message: String,
    },
    Custom {
        message: String,
    },

    // Type
    TypeMismatch {
        expected: String,
        got: String,
    },
    InvalidRange {
        left: String,
        right: String,
    },

    // Unsupported
    UnsupportedOperation {
        op: String,
        type_name: String,
    },

    // Exception
    UnhandledException {
        value: String,
    },
}

impl EvalErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UndeclaredIdentifier { .. }
            | Self::MeOutsideInstance
            | Self::UndeclaredFunction { .. }
            | Self::UndeclaredType { .. }
            | Self::DuplicateFunction { .. }
            | Self::DuplicateType { .. }
            | Self::ArityMismatch { .. }
            | Self::IllegalAccess { .. }
            | Self::UndefinedAttribute { .. }
            | Self::UndefinedMethod { .. }
            | Self::MissingOverload { .. }
            | Self::TooManyInitializers { .. }
            | Self::InvalidAssignment { .. }
            | Self::NotCallable { .. } => ErrorCategory::Syntax,

            Self::RecursionLimit { .. }
            | Self::DivisionByZero
            | Self::IndexOutOfBounds { .. }
            | Self::NoMappedValue { .. }
            | Self::ConstantModification
            | Self::Thread { .. }
            | Self::Extern { .. }
            | Self::Custom { .. } => ErrorCategory::Generic,

            Self::TypeMismatch { .. } | Self::InvalidRange { .. } => ErrorCategory::Type,

            Self::UnsupportedOperation { .. } => ErrorCategory::Unsupported,

            Self::UnhandledException { .. } => ErrorCategory::Exception,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Syntax
            Self::UndeclaredIdentifier { name } => {
                write!(f, "'{name}' undeclared identifier")
            }
            Self::MeOutsideInstance => {
                write!(f, "'me' can only be used inside a class method")
            }
            Self::UndeclaredFunction { name } => write!(f, "'{name}' undeclared function"),
            Self::UndeclaredType { name } => write!(f, "'{name}' undeclared type"),
            Self::DuplicateFunction { name } => {
                write!(f, "function '{name}' already defined")
            }
            Self::DuplicateType { name } => write!(f, "type '{name}' already defined"),
            Self::ArityMismatch {
                name,
                expected,
                variadic,
                got,
            } => {
                let at_least = if *variadic { "at least " } else { "" };
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                write!(
                    f,
                    "'{name}' requires {at_least}{expected} {arg_word}, {got} given"
                )
            }
            Self::IllegalAccess {
                type_name,
                member,
                access,
            } => write!(
                f,
                "could not access {access} member '{member}' of type '{type_name}'"
            ),
            Self::UndefinedAttribute {
                type_name,
                attribute,
            } => write!(f, "'{attribute}' is not an attribute of '{type_name}'"),
            Self::UndefinedMethod { type_name, method } => {
                write!(f, "'{method}' is not a method of '{type_name}'")
            }
            Self::MissingOverload { type_name, op } => {
                write!(f, "class '{type_name}' does not overload the '{op}' operator")
            }
            Self::TooManyInitializers {
                type_name,
                expected,
                got,
            } => write!(
                f,
                "'{type_name}' has {expected} attributes, {got} initializers given"
            ),
            Self::InvalidAssignment { target } => {
                write!(f, "cannot assign to {target}")
            }
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),

            // Generic
            Self::RecursionLimit { limit } => {
                write!(f, "max nested calls reached (limit: {limit})")
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IndexOutOfBounds { index, size } => {
                write!(f, "index {index} out of bounds for size {size}")
            }
            Self::NoMappedValue { key } => write!(f, "no mapped value for key {key}"),
            Self::ConstantModification => write!(f, "cannot modify a constant value"),
            Self::Thread { message } => write!(f, "thread error: {message}"),
            Self::Extern { message } => write!(f, "extern call failed: {message}"),
            Self::Custom { message } => write!(f, "{message}"),

            // Type
            Self::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            Self::InvalidRange { left, right } => write!(
                f,
                "range requires two integers or two chars, got {left} and {right}"
            ),

            // Unsupported
            Self::UnsupportedOperation { op, type_name } => {
                write!(f, "'{op}' operator not supported for type '{type_name}'")
            }

            // Exception
            Self::UnhandledException { value } => f.write_str(value),
        }
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug)]
pub struct BacktraceFrame {
    /// Function or method name.
    pub name: String,
    /// Source location of the call site.
    pub span: Option<Span>,
}

/// Immutable snapshot of the call stack at an error site.
#[derive(Clone, Debug, Default)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack trace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Source location of the node being evaluated when the error occurred.
    pub span: Option<Span>,
    /// Script call stack at the error site, when stack traces are enabled.
    pub backtrace: Option<EvalBacktrace>,
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    /// Create an error from a structured kind.
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Attach a span unless one was already recorded closer to the fault.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Attach a backtrace unless one was already captured.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.message)
    }
}

impl std::error::Error for EvalError {}

// Syntax errors

#[cold]
pub fn undeclared_identifier(name: &str) -> EvalError {
    if name == "me" {
        return EvalError::from_kind(EvalErrorKind::MeOutsideInstance);
    }
    EvalError::from_kind(EvalErrorKind::UndeclaredIdentifier {
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndeclaredFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_type(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndeclaredType {
        name: name.to_string(),
    })
}

#[cold]
pub fn duplicate_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DuplicateFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn duplicate_type(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DuplicateType {
        name: name.to_string(),
    })
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, variadic: bool, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        variadic,
        got,
    })
}

#[cold]
pub fn illegal_access(type_name: &str, member: &str, access: Access) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IllegalAccess {
        type_name: type_name.to_string(),
        member: member.to_string(),
        access,
    })
}

#[cold]
pub fn undefined_attribute(type_name: &str, attribute: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedAttribute {
        type_name: type_name.to_string(),
        attribute: attribute.to_string(),
    })
}

#[cold]
pub fn undefined_method(type_name: &str, method: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        type_name: type_name.to_string(),
        method: method.to_string(),
    })
}

#[cold]
pub fn missing_overload(type_name: &str, op: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingOverload {
        type_name: type_name.to_string(),
        op: op.to_string(),
    })
}

#[cold]
pub fn too_many_initializers(type_name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TooManyInitializers {
        type_name: type_name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn invalid_assignment(target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidAssignment {
        target: target.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

// Generic errors

#[cold]
pub fn recursion_limit(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimit { limit })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn index_out_of_bounds(index: i64, size: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, size })
}

#[cold]
pub fn no_mapped_value(key: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMappedValue {
        key: key.to_string(),
    })
}

#[cold]
pub fn constant_modification() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstantModification)
}

#[cold]
pub fn thread_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Thread {
        message: message.into(),
    })
}

#[cold]
pub fn extern_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Extern {
        message: message.into(),
    })
}

// Type errors

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn invalid_range(left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidRange {
        left: left.to_string(),
        right: right.to_string(),
    })
}

// Unsupported operations

#[cold]
pub fn unsupported_operation(op: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedOperation {
        op: op.to_string(),
        type_name: type_name.to_string(),
    })
}

// Exceptions

#[cold]
pub fn unhandled_exception(value: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnhandledException {
        value: value.into(),
    })
}

#[cfg(test)]
mod tests;
