// belay-core - Error types for the evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for evaluation and namespace loading.

use std::fmt;
use std::path::PathBuf;

use belay_reader::{ParseError, Symbol, Value};
use thiserror::Error;

/// Result type for evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum Error {
    /// Undefined symbol reference
    #[error("Unable to resolve symbol: {0}")]
    UndefinedSymbol(Symbol),

    /// A var exists but has no root value yet
    #[error("Var {0} is unbound")]
    UnboundVar(String),

    /// Wrong number of arguments to a function
    #[error("{}", arity_message(.expected, .got, .name))]
    ArityError {
        expected: AritySpec,
        got: usize,
        name: Option<String>,
    },

    /// Wrong type for an operation
    #[error("{}: expected {expected}, got {got}", .context.as_deref().unwrap_or("Type error"))]
    TypeError {
        expected: &'static str,
        got: &'static str,
        context: Option<String>,
    },

    /// Attempted to call something that isn't callable
    #[error("Cannot call value: {0}")]
    NotCallable(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// Invalid special form syntax
    #[error("Invalid '{form}' syntax: {message}")]
    InvalidSyntax { form: &'static str, message: String },

    /// No namespace of that name exists and no module source provides it
    #[error("Could not locate namespace {0}")]
    NamespaceNotFound(String),

    /// A namespace was located but evaluating it failed
    #[error("Error loading namespace {ns}")]
    ModuleLoad {
        ns: String,
        #[source]
        source: Box<Error>,
    },

    /// Source text could not be read
    #[error(transparent)]
    Read(#[from] ParseError),

    #[error("Error reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nested evaluation exceeded the configured maximum
    #[error("Stack overflow: maximum recursion depth ({max}) exceeded")]
    DepthExceeded { max: usize },

    /// General evaluation error
    #[error("{0}")]
    EvalError(String),

    /// Internal error - invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specification for expected arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{}", n),
            AritySpec::AtLeast(n) => write!(f, "at least {}", n),
            AritySpec::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

fn arity_message(expected: &AritySpec, got: &usize, name: &Option<String>) -> String {
    match name {
        Some(name) => format!(
            "Wrong number of arguments to '{}': expected {}, got {}",
            name, expected, got
        ),
        None => format!("Wrong number of arguments: expected {}, got {}", expected, got),
    }
}

impl Error {
    /// Create an arity error for exact arity.
    pub fn arity(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Exact(expected),
            got,
            name: None,
        }
    }

    /// Create an arity error for exact arity with function name.
    pub fn arity_named(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Exact(expected),
            got,
            name: Some(name.into()),
        }
    }

    /// Create an arity error for minimum arity.
    pub fn arity_at_least(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::AtLeast(expected),
            got,
            name: Some(name.into()),
        }
    }

    /// Create a type error with context.
    pub fn type_error_in(
        context: impl Into<String>,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Error::TypeError {
            expected,
            got,
            context: Some(context.into()),
        }
    }

    /// Create an invalid syntax error.
    pub fn syntax(form: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidSyntax {
            form,
            message: message.into(),
        }
    }

    pub fn not_callable(val: &Value) -> Self {
        Error::NotCallable(val.to_string())
    }
}
