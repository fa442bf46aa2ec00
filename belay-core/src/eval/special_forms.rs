// belay-core - Core special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `quote`, `if`, `do`, `def`, `declare`, `fn`, `defn` and `let`.

use std::any::Any;
use std::rc::Rc;

use belay_reader::{FnArity, Function, Symbol, Value};

use super::{eval, eval_body};
use crate::env::Env;
use crate::error::{Error, Result};

/// (quote form)
pub(crate) fn eval_quote(args: &[Value]) -> Result<Value> {
    match args {
        [form] => Ok(form.clone()),
        _ => Err(Error::syntax("quote", "requires exactly 1 argument")),
    }
}

/// (if test then else?)
pub(crate) fn eval_if(args: &[Value], env: &Env) -> Result<Value> {
    let (test, then, otherwise) = match args {
        [test, then] => (test, then, None),
        [test, then, otherwise] => (test, then, Some(otherwise)),
        _ => return Err(Error::syntax("if", "requires 2 or 3 arguments")),
    };
    if eval(test, env)?.is_truthy() {
        eval(then, env)
    } else {
        otherwise.map_or(Ok(Value::Nil), |form| eval(form, env))
    }
}

/// (do forms...)
pub(crate) fn eval_do(args: &[Value], env: &Env) -> Result<Value> {
    eval_body(args, env)
}

/// (def name) / (def name value) / (def name "doc" value)
///
/// The Var is interned before the value is evaluated, so the value may
/// refer to it.
pub(crate) fn eval_def(args: &[Value], env: &Env) -> Result<Value> {
    let (name, value) = match args {
        [name] => (name, None),
        [name, value] | [name, Value::String(_), value] => (name, Some(value)),
        _ => return Err(Error::syntax("def", "requires a name and at most a docstring and value")),
    };
    let sym = def_name("def", name, env)?;
    let registry = env.registry()?;
    let var = registry.current().intern(sym.name());
    if let Some(form) = value {
        var.bind(eval(form, env)?);
    }
    Ok(Value::symbol(Symbol::with_namespace(var.ns(), var.name())))
}

/// (declare names...)
pub(crate) fn eval_declare(args: &[Value], env: &Env) -> Result<Value> {
    let current = env.registry()?.current();
    for arg in args {
        let sym = def_name("declare", arg, env)?;
        current.intern(sym.name());
    }
    Ok(Value::Nil)
}

/// (fn name? [params] body...) / (fn name? ([params] body...)+)
pub(crate) fn eval_fn(args: &[Value], env: &Env) -> Result<Value> {
    let (name, tail) = match args {
        [Value::Symbol(sym), tail @ ..] => (Some(sym.clone()), tail),
        tail => (None, tail),
    };
    make_fn("fn", name, tail, env)
}

/// (defn name "doc"? [params] body...) / (defn name "doc"? ([params] body...)+)
pub(crate) fn eval_defn(args: &[Value], env: &Env) -> Result<Value> {
    let Some((name, rest)) = args.split_first() else {
        return Err(Error::syntax("defn", "requires a name"));
    };
    let sym = def_name("defn", name, env)?;
    let tail = match rest {
        [Value::String(_), tail @ ..] if !tail.is_empty() => tail,
        tail => tail,
    };
    let var = env.registry()?.current().intern(sym.name());
    let func = make_fn("defn", Some(Symbol::new(sym.name())), tail, env)?;
    var.bind(func);
    Ok(Value::symbol(Symbol::with_namespace(var.ns(), var.name())))
}

/// (let [name value ...] body...)
pub(crate) fn eval_let(args: &[Value], env: &Env) -> Result<Value> {
    let Some((Value::Vector(bindings), body)) = args.split_first() else {
        return Err(Error::syntax("let", "requires a binding vector"));
    };
    if bindings.len() % 2 != 0 {
        return Err(Error::syntax("let", "binding vector requires an even number of forms"));
    }
    let let_env = env.child();
    let bindings: Vec<&Value> = bindings.iter().collect();
    for pair in bindings.chunks(2) {
        let Value::Symbol(sym) = pair[0] else {
            return Err(Error::syntax(
                "let",
                format!("binding name must be a symbol, got {}", pair[0].type_name()),
            ));
        };
        let value = eval(pair[1], &let_env)?;
        let_env.define(sym.clone(), value);
    }
    eval_body(body, &let_env)
}

// ============================================================================
// Helpers
// ============================================================================

/// The symbol being defined. A qualified name must name the current namespace.
fn def_name(form: &'static str, name: &Value, env: &Env) -> Result<Symbol> {
    let Value::Symbol(sym) = name else {
        return Err(Error::syntax(
            form,
            format!("name must be a symbol, got {}", name.type_name()),
        ));
    };
    if let Some(ns) = sym.namespace() {
        let current = env.registry()?.current_name();
        if ns != &*current {
            return Err(Error::syntax(
                form,
                format!("can't define {} from namespace {}", sym, current),
            ));
        }
    }
    Ok(sym.clone())
}

fn make_fn(form: &'static str, name: Option<Symbol>, tail: &[Value], env: &Env) -> Result<Value> {
    let arities = match tail {
        [Value::Vector(params), body @ ..] => vec![parse_arity(form, params.iter(), body)?],
        [] => return Err(Error::syntax(form, "requires a parameter vector")),
        clauses => clauses
            .iter()
            .map(|clause| match clause {
                Value::List(items) => {
                    let items: Vec<Value> = items.iter().cloned().collect();
                    match items.split_first() {
                        Some((Value::Vector(params), body)) => parse_arity(form, params.iter(), body),
                        _ => Err(Error::syntax(form, "arity clause must start with a parameter vector")),
                    }
                }
                other => Err(Error::syntax(
                    form,
                    format!("expected parameter vector or arity list, got {}", other.type_name()),
                )),
            })
            .collect::<Result<Vec<_>>>()?,
    };

    if arities.iter().filter(|a| a.rest_param.is_some()).count() > 1 {
        return Err(Error::syntax(form, "can't have more than one variadic arity"));
    }

    let captured: Rc<dyn Any> = Rc::new(env.clone());
    Ok(Value::Fn(Function::new(name, arities, captured)))
}

/// Parse `[a b & more]` into fixed params and an optional rest param.
fn parse_arity<'a>(
    form: &'static str,
    params: impl Iterator<Item = &'a Value>,
    body: &[Value],
) -> Result<FnArity> {
    let mut fixed = Vec::new();
    let mut rest = None;
    let mut params = params.peekable();
    while let Some(param) = params.next() {
        let Value::Symbol(sym) = param else {
            return Err(Error::syntax(
                form,
                format!("parameter must be a symbol, got {}", param.type_name()),
            ));
        };
        if sym.name() == "&" && !sym.has_namespace() {
            match (params.next(), params.peek()) {
                (Some(Value::Symbol(rest_sym)), None) => rest = Some(rest_sym.clone()),
                _ => return Err(Error::syntax(form, "& must be followed by exactly one symbol")),
            }
        } else {
            fixed.push(sym.clone());
        }
    }
    Ok(FnArity::new(fixed, rest, body.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval_str;
    use crate::standard_env;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quote_and_if() {
        let env = standard_env();
        assert_eq!(eval_str("'(a b)", &env).unwrap().to_string(), "(a b)");
        assert_eq!(eval_str("(if nil 1 2)", &env).unwrap(), Value::int(2));
        assert_eq!(eval_str("(if false 1)", &env).unwrap(), Value::Nil);
        assert!(eval_str("(if)", &env).is_err());
    }

    #[test]
    fn test_def_returns_qualified_symbol() {
        let env = standard_env();
        let result = eval_str("(def x 1)", &env).unwrap();
        assert_eq!(result, Value::symbol(Symbol::with_namespace("user", "x")));
        assert_eq!(eval_str("x", &env).unwrap(), Value::int(1));
    }

    #[test]
    fn test_declare_leaves_var_unbound() {
        let env = standard_env();
        eval_str("(declare later)", &env).unwrap();
        let var = env.registry().unwrap().current().find_var("later").unwrap();
        assert!(!var.is_bound());
        assert!(matches!(eval_str("later", &env), Err(Error::UnboundVar(_))));
    }

    #[test]
    fn test_def_in_other_namespace_rejected() {
        let env = standard_env();
        assert!(eval_str("(def other/x 1)", &env).is_err());
        assert!(eval_str("(def user/x 1)", &env).is_ok());
    }

    #[test]
    fn test_fn_variants() {
        let env = standard_env();
        assert_eq!(eval_str("((fn [] 42))", &env).unwrap(), Value::int(42));
        assert_eq!(
            eval_str("((fn [a & more] more) 1 2 3)", &env).unwrap(),
            Value::list([Value::int(2), Value::int(3)])
        );
        assert_eq!(
            eval_str("((fn f ([] (f 1)) ([x] (inc x))))", &env).unwrap(),
            Value::int(2)
        );
        assert!(eval_str("(fn [a &] a)", &env).is_err());
        assert!(eval_str("(fn [1] 1)", &env).is_err());
    }

    #[test]
    fn test_defn_with_docstring() {
        let env = standard_env();
        eval_str("(defn add \"Adds two numbers.\" [a b] (+ a b))", &env).unwrap();
        assert_eq!(eval_str("(add 2 3)", &env).unwrap(), Value::int(5));
    }

    #[test]
    fn test_let_is_sequential() {
        let env = standard_env();
        assert_eq!(
            eval_str("(let [a 1 b (inc a)] (+ a b))", &env).unwrap(),
            Value::int(3)
        );
        assert!(eval_str("(let [a] a)", &env).is_err());
    }
}
