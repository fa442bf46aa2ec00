// belay-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers for belay-core integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

pub use belay_core::{Env, NamespaceRegistry, standard_env};
pub use belay_reader::{Keyword, Symbol, Value};

/// Evaluate all forms in `s` in a fresh environment with builtins.
pub fn eval_str(s: &str) -> Result<Value, String> {
    eval_all(s, &standard_env())
}

/// Evaluate all forms in `s` in the given environment, returning the last.
pub fn eval_all(s: &str, env: &Env) -> Result<Value, String> {
    belay_core::eval_str(s, env).map_err(|e| e.to_string())
}

/// The registry behind an environment.
pub fn registry(env: &Env) -> NamespaceRegistry {
    env.registry().expect("environment has a registry")
}

pub fn kw(name: &str) -> Value {
    Value::keyword(Keyword::new(name))
}

pub fn sym(name: &str) -> Value {
    Value::symbol(Symbol::parse(name))
}

/// Assert that evaluating `input` produces the expected value.
///
/// ```ignore
/// assert_eval!("(+ 1 2)", Value::int(3));
/// ```
#[macro_export]
macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = $crate::common::eval_str($input);
        assert!(
            result.is_ok(),
            "Failed to evaluate '{}': {:?}",
            $input,
            result.err()
        );
        assert_eq!(
            result.unwrap(),
            $expected,
            "Evaluation of '{}' did not match expected",
            $input
        );
    };
}

/// Assert that evaluating `input` produces an error mentioning `fragment`.
#[macro_export]
macro_rules! assert_eval_err {
    ($input:expr) => {
        let result = $crate::common::eval_str($input);
        assert!(
            result.is_err(),
            "Expected error for '{}' but got {:?}",
            $input,
            result.ok()
        );
    };
    ($input:expr, $fragment:expr) => {
        let result = $crate::common::eval_str($input);
        match result {
            Err(message) => assert!(
                message.contains($fragment),
                "Error for '{}' was {:?}, expected it to mention {:?}",
                $input,
                message,
                $fragment
            ),
            Ok(value) => panic!("Expected error for '{}' but got {}", $input, value),
        }
    };
}
