// belay-core - AST-walking evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! AST-walking evaluator.

pub mod apply;
mod namespaces;
mod special_forms;

pub use apply::{NativeFnImpl, apply, make_native_fn};
pub use namespaces::require;

use std::cell::Cell;

use belay_reader::{Parser, Symbol, Value, Vector};

use crate::env::Env;
use crate::error::{Error, Result};

// ============================================================================
// Recursion Depth
// ============================================================================

/// Default maximum nesting of `eval` calls.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 10_000;

thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// The depth limit of the registry behind `env`.
fn max_eval_depth(env: &Env) -> usize {
    env.registry()
        .map(|registry| registry.max_eval_depth())
        .unwrap_or(DEFAULT_MAX_EVAL_DEPTH)
}

/// Get the current eval recursion depth.
#[inline]
#[must_use]
pub fn get_eval_depth() -> usize {
    EVAL_DEPTH.with(|d| d.get())
}

/// RAII guard to manage the eval depth counter.
struct EvalDepthGuard;

impl EvalDepthGuard {
    fn new(max: usize) -> Result<Self> {
        let current = EVAL_DEPTH.with(|d| {
            let current = d.get() + 1;
            d.set(current);
            current
        });
        if current > max {
            EVAL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
            Err(Error::DepthExceeded { max })
        } else {
            Ok(EvalDepthGuard)
        }
    }
}

impl Drop for EvalDepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate a form in an environment.
pub fn eval(expr: &Value, env: &Env) -> Result<Value> {
    let _guard = EvalDepthGuard::new(max_eval_depth(env))?;

    match expr {
        Value::Symbol(sym) => eval_symbol(sym, env),

        Value::List(items) => eval_list(items, env),

        Value::Vector(items) => {
            let evaluated: Result<Vec<_>> = items.iter().map(|e| eval(e, env)).collect();
            Ok(Value::vector(evaluated?))
        }

        Value::Map(map) => {
            let mut result = Vec::with_capacity(map.len());
            for (k, v) in map.iter() {
                result.push((eval(k, env)?, eval(v, env)?));
            }
            Ok(Value::map(result))
        }

        Value::Set(items) => {
            let evaluated: Result<Vec<_>> = items.iter().map(|e| eval(e, env)).collect();
            Ok(Value::set(evaluated?))
        }

        // Everything else is self-evaluating
        _ => Ok(expr.clone()),
    }
}

/// Read and evaluate every form in `source`, returning the last value.
pub fn eval_str(source: &str, env: &Env) -> Result<Value> {
    let forms = Parser::parse_all_str(source)?;
    eval_body(&forms, env)
}

/// Evaluate forms in order, returning the last value (nil if empty).
pub(crate) fn eval_body(forms: &[Value], env: &Env) -> Result<Value> {
    let mut result = Value::Nil;
    for form in forms {
        result = eval(form, env)?;
    }
    Ok(result)
}

/// Locals first, then the namespace registry. Vars are dereferenced.
fn eval_symbol(sym: &Symbol, env: &Env) -> Result<Value> {
    if !sym.has_namespace()
        && let Some(val) = env.lookup(sym)
    {
        return Ok(val);
    }
    let registry = env.registry()?;
    match registry.resolve(sym) {
        Some(var) => var.deref(),
        None => Err(Error::UndefinedSymbol(sym.clone())),
    }
}

fn eval_list(items: &Vector<Value>, env: &Env) -> Result<Value> {
    let Some(head) = items.front() else {
        return Ok(Value::list([]));
    };
    let items: Vec<Value> = items.iter().cloned().collect();
    let args = &items[1..];

    if let Value::Symbol(sym) = head
        && !sym.has_namespace()
        && let Some(result) = eval_special_form(sym.name(), args, env)
    {
        return result;
    }

    let func = eval(head, env)?;
    let evaluated: Result<Vec<_>> = args.iter().map(|arg| eval(arg, env)).collect();
    apply(&func, &evaluated?)
}

/// Dispatch a special form, or `None` if `name` isn't one.
fn eval_special_form(name: &str, args: &[Value], env: &Env) -> Option<Result<Value>> {
    use namespaces::{eval_in_ns, eval_ns, eval_require};
    use special_forms::{
        eval_declare, eval_def, eval_defn, eval_do, eval_fn, eval_if, eval_let, eval_quote,
    };

    let result = match name {
        "quote" => eval_quote(args),
        "if" => eval_if(args, env),
        "do" => eval_do(args, env),
        "def" => eval_def(args, env),
        "declare" => eval_declare(args, env),
        "fn" | "fn*" => eval_fn(args, env),
        "defn" => eval_defn(args, env),
        "let" => eval_let(args, env),
        "ns" => eval_ns(args, env),
        "in-ns" => eval_in_ns(args, env),
        "require" => eval_require(args, env),
        _ => return None,
    };
    Some(result)
}
