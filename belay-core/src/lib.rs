// belay-core - Runtime and evaluator for the belay host
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # belay-core
//!
//! The host runtime the bridge resolves symbols against: namespaces of
//! Vars, an AST-walking evaluator over `belay_reader::Value` forms, native
//! builtins in `belay.core`, and the module sources `require` loads
//! namespaces from.

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod namespace;
pub mod source;

pub use builtins::register_builtins;
pub use env::Env;
pub use error::{AritySpec, Error, Result};
pub use eval::{
    DEFAULT_MAX_EVAL_DEPTH, NativeFnImpl, apply, eval, eval_str, get_eval_depth, make_native_fn,
    require,
};
pub use namespace::{Namespace, NamespaceRegistry, Var};
pub use source::{Module, ModuleSource, NativeModule, SOURCE_EXTENSION};

// Re-export reader types for convenience
pub use belay_reader::{Keyword, Symbol, Value};

/// Create a root environment with the builtins installed.
pub fn standard_env() -> Env {
    let registry = NamespaceRegistry::new();
    register_builtins(&registry);
    Env::with_registry(registry)
}
