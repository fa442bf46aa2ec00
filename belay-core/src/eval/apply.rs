// belay-core - Function application
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Function application.

use std::any::Any;
use std::rc::Rc;

use belay_reader::{Function, NativeFn, Value};

use super::eval_body;
use crate::env::Env;
use crate::error::{Error, Result};

/// Type alias for native function signature.
pub type NativeFnImpl = dyn Fn(&[Value]) -> Result<Value>;

/// Apply a function to arguments.
///
/// Besides functions, keywords and maps are callable as lookups:
/// `(:a m)` and `(m :a)` both read key `:a` from `m`.
pub fn apply(func: &Value, args: &[Value]) -> Result<Value> {
    match func {
        Value::Fn(f) => apply_fn(f, args),
        Value::NativeFn(f) => apply_native(f, args),
        Value::Keyword(kw) => {
            let (target, default) = lookup_args(&kw.to_string(), args)?;
            Ok(match target {
                Value::Map(map) => map.get(func).cloned().unwrap_or(default),
                _ => default,
            })
        }
        Value::Map(map) => {
            let (key, default) = lookup_args("map", args)?;
            Ok(map.get(key).cloned().unwrap_or(default))
        }
        other => Err(Error::not_callable(other)),
    }
}

/// Split `(f x)` / `(f x default)` arguments.
fn lookup_args<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, Value)> {
    match args {
        [target] => Ok((target, Value::Nil)),
        [target, default] => Ok((target, default.clone())),
        _ => Err(Error::arity_named(name, 1, args.len())),
    }
}

/// Apply a user-defined function.
pub(crate) fn apply_fn(func: &Function, args: &[Value]) -> Result<Value> {
    let arity = func.find_arity(args.len()).ok_or_else(|| {
        let arity_strs: Vec<String> = func
            .arities
            .iter()
            .map(|a| {
                if a.rest_param.is_some() {
                    format!("{}+", a.params.len())
                } else {
                    a.params.len().to_string()
                }
            })
            .collect();
        Error::EvalError(format!(
            "Wrong number of args ({}) passed to {}; expected {}",
            args.len(),
            func.name
                .as_ref()
                .map_or_else(|| "fn".to_string(), ToString::to_string),
            arity_strs.join(" or ")
        ))
    })?;

    let captured_env = func
        .env
        .downcast_ref::<Env>()
        .ok_or_else(|| Error::Internal("Function environment has invalid type".into()))?;

    let fn_env = captured_env.child();

    // Bind function name for self-recursion if present
    if let Some(name) = &func.name {
        fn_env.define(name.clone(), Value::Fn(func.clone()));
    }

    for (param, arg) in arity.params.iter().zip(args) {
        fn_env.define(param.clone(), arg.clone());
    }
    if let Some(rest) = &arity.rest_param {
        let rest_args = &args[arity.params.len()..];
        let rest_val = if rest_args.is_empty() {
            Value::Nil
        } else {
            Value::list(rest_args.iter().cloned())
        };
        fn_env.define(rest.clone(), rest_val);
    }

    eval_body(&arity.body, &fn_env)
}

/// Apply a native function.
pub(crate) fn apply_native(func: &NativeFn, args: &[Value]) -> Result<Value> {
    let f = func
        .func()
        .downcast_ref::<Rc<NativeFnImpl>>()
        .ok_or_else(|| Error::Internal("Native function has invalid type".into()))?;
    f(args)
}

/// Create a native function value.
pub fn make_native_fn(
    name: &str,
    func: impl Fn(&[Value]) -> Result<Value> + 'static,
) -> NativeFn {
    let func_rc: Rc<NativeFnImpl> = Rc::new(func);
    let func_any: Rc<dyn Any> = Rc::new(func_rc);
    NativeFn::new(name, func_any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use belay_reader::Keyword;

    #[test]
    fn test_native_fn_roundtrip() {
        let double = make_native_fn("double", |args| match args {
            [Value::Int(n)] => Ok(Value::int(n * 2)),
            _ => Err(Error::arity_named("double", 1, args.len())),
        });
        let func = Value::NativeFn(double);
        assert_eq!(apply(&func, &[Value::int(21)]).unwrap(), Value::int(42));
        assert!(apply(&func, &[]).is_err());
    }

    #[test]
    fn test_keyword_and_map_lookup() {
        let kw = Value::keyword(Keyword::new("a"));
        let map = Value::map([(kw.clone(), Value::int(1))]);

        assert_eq!(apply(&kw, &[map.clone()]).unwrap(), Value::int(1));
        assert_eq!(apply(&map, &[kw.clone()]).unwrap(), Value::int(1));
        assert_eq!(
            apply(&map, &[Value::int(0), Value::string("dflt")]).unwrap(),
            Value::string("dflt")
        );
        assert_eq!(apply(&kw, &[Value::Nil]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_not_callable() {
        let err = apply(&Value::int(1), &[]).unwrap_err();
        assert!(matches!(err, Error::NotCallable(s) if s == "1"));
    }
}
