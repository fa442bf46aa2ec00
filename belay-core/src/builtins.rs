// belay-core - Built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Built-in functions, installed into `belay.core`.
//!
//! ## Integer Overflow Behaviour
//!
//! Integer arithmetic is checked: an `i64` result that would overflow is an
//! error rather than a silent wrap. Operations with a bigint operand stay in
//! bigints; operations with a float operand produce floats.

use std::cmp::Ordering;

use belay_reader::{BigInt, Value};
use num_traits::{ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::eval::make_native_fn;
use crate::namespace::{Namespace, NamespaceRegistry};

/// Install the builtins into the registry's `belay.core` namespace.
pub fn register_builtins(registry: &NamespaceRegistry) {
    let core = registry.core();

    // Arithmetic
    define_native(&core, "+", builtin_add);
    define_native(&core, "-", builtin_sub);
    define_native(&core, "*", builtin_mul);
    define_native(&core, "/", builtin_div);
    define_native(&core, "inc", builtin_inc);
    define_native(&core, "dec", builtin_dec);

    // Comparison
    define_native(&core, "=", builtin_eq);
    define_native(&core, "<", builtin_lt);
    define_native(&core, ">", builtin_gt);

    // Predicates and logic
    define_native(&core, "not", builtin_not);
    define_native(&core, "nil?", builtin_nil_p);
    define_native(&core, "fn?", builtin_fn_p);

    // Strings and collections
    define_native(&core, "str", builtin_str);
    define_native(&core, "list", builtin_list);
    define_native(&core, "vector", builtin_vector);
    define_native(&core, "hash-map", builtin_hash_map);
    define_native(&core, "count", builtin_count);
    define_native(&core, "first", builtin_first);
    define_native(&core, "get", builtin_get);
}

fn define_native(ns: &Namespace, name: &str, func: fn(&[Value]) -> Result<Value>) {
    ns.intern_with_value(name, Value::NativeFn(make_native_fn(name, func)));
}

// ============================================================================
// Numbers
// ============================================================================

/// A numeric operand, widened as needed.
enum Num {
    Int(i64),
    Big(BigInt),
    Float(f64),
}

impl Num {
    fn from_value(op: &str, val: &Value) -> Result<Num> {
        match val {
            Value::Int(n) => Ok(Num::Int(*n)),
            Value::BigInt(n) => Ok(Num::Big(n.as_ref().clone())),
            Value::Float(n) => Ok(Num::Float(*n)),
            other => Err(Error::type_error_in(op, "number", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(n) => Value::int(n),
            Num::Big(n) => Value::bigint(n),
            Num::Float(n) => Value::float(n),
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(n) => *n as f64,
            Num::Big(n) => n.to_f64().unwrap_or(f64::NAN),
            Num::Float(n) => *n,
        }
    }

    fn to_big(&self) -> BigInt {
        match self {
            Num::Int(n) => BigInt::from(*n),
            Num::Big(n) => n.clone(),
            // Only reached for integer operands
            Num::Float(n) => BigInt::from(*n as i64),
        }
    }
}

/// Combine two numbers with checked integer, bigint and float variants.
fn combine(
    op: &'static str,
    a: Num,
    b: Num,
    checked: fn(i64, i64) -> Option<i64>,
    big: fn(BigInt, BigInt) -> BigInt,
    float: fn(f64, f64) -> f64,
) -> Result<Num> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => checked(x, y)
            .map(Num::Int)
            .ok_or_else(|| Error::EvalError(format!("Integer overflow in {}", op))),
        (a @ Num::Float(_), b) | (a, b @ Num::Float(_)) => {
            Ok(Num::Float(float(a.to_f64(), b.to_f64())))
        }
        (a, b) => Ok(Num::Big(big(a.to_big(), b.to_big()))),
    }
}

fn fold_numbers(
    op: &'static str,
    args: &[Value],
    identity: i64,
    checked: fn(i64, i64) -> Option<i64>,
    big: fn(BigInt, BigInt) -> BigInt,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    let mut acc = Num::Int(identity);
    for arg in args {
        acc = combine(op, acc, Num::from_value(op, arg)?, checked, big, float)?;
    }
    Ok(acc.into_value())
}

pub(crate) fn builtin_add(args: &[Value]) -> Result<Value> {
    fold_numbers("+", args, 0, i64::checked_add, |a, b| a + b, |a, b| a + b)
}

pub(crate) fn builtin_mul(args: &[Value]) -> Result<Value> {
    fold_numbers("*", args, 1, i64::checked_mul, |a, b| a * b, |a, b| a * b)
}

pub(crate) fn builtin_sub(args: &[Value]) -> Result<Value> {
    match args {
        [] => Err(Error::arity_at_least("-", 1, 0)),
        [only] => negate(only),
        [first, rest @ ..] => {
            let mut acc = Num::from_value("-", first)?;
            for arg in rest {
                let arg = Num::from_value("-", arg)?;
                acc = combine("-", acc, arg, i64::checked_sub, |a, b| a - b, |a, b| a - b)?;
            }
            Ok(acc.into_value())
        }
    }
}

fn negate(val: &Value) -> Result<Value> {
    match Num::from_value("-", val)? {
        Num::Int(n) => n
            .checked_neg()
            .map(Value::int)
            .ok_or_else(|| Error::EvalError("Integer overflow in -".to_string())),
        Num::Big(n) => Ok(Value::bigint(-n)),
        Num::Float(n) => Ok(Value::float(-n)),
    }
}

/// Integer division is exact when the divisor divides evenly and produces
/// a float otherwise.
pub(crate) fn builtin_div(args: &[Value]) -> Result<Value> {
    let (first, rest) = match args {
        [] => return Err(Error::arity_at_least("/", 1, 0)),
        [only] => (Num::Int(1), std::slice::from_ref(only)),
        [first, rest @ ..] => (Num::from_value("/", first)?, rest),
    };
    let mut acc = first;
    for arg in rest {
        let divisor = Num::from_value("/", arg)?;
        acc = match (acc, divisor) {
            (Num::Int(_) | Num::Big(_), Num::Int(0)) => return Err(Error::DivisionByZero),
            (_, Num::Big(d)) if d.is_zero() => return Err(Error::DivisionByZero),
            (Num::Int(x), Num::Int(y)) if x.checked_rem(y) == Some(0) => Num::Int(x / y),
            (a @ (Num::Int(_) | Num::Big(_)), b @ (Num::Int(_) | Num::Big(_)))
                if (a.to_big() % b.to_big()).is_zero() =>
            {
                Num::Big(a.to_big() / b.to_big())
            }
            (a, b) => Num::Float(a.to_f64() / b.to_f64()),
        };
    }
    Ok(acc.into_value())
}

pub(crate) fn builtin_inc(args: &[Value]) -> Result<Value> {
    match args {
        [n] => builtin_add(&[n.clone(), Value::int(1)]),
        _ => Err(Error::arity_named("inc", 1, args.len())),
    }
}

pub(crate) fn builtin_dec(args: &[Value]) -> Result<Value> {
    match args {
        [n] => builtin_sub(&[n.clone(), Value::int(1)]),
        _ => Err(Error::arity_named("dec", 1, args.len())),
    }
}

// ============================================================================
// Comparison
// ============================================================================

pub(crate) fn builtin_eq(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least("=", 1, 0));
    }
    Ok(Value::bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn compare_chain(op: &'static str, args: &[Value], expected: Ordering) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least(op, 1, 0));
    }
    for arg in args {
        Num::from_value(op, arg)?;
    }
    Ok(Value::bool(
        args.windows(2).all(|pair| pair[0].cmp(&pair[1]) == expected),
    ))
}

pub(crate) fn builtin_lt(args: &[Value]) -> Result<Value> {
    compare_chain("<", args, Ordering::Less)
}

pub(crate) fn builtin_gt(args: &[Value]) -> Result<Value> {
    compare_chain(">", args, Ordering::Greater)
}

// ============================================================================
// Predicates
// ============================================================================

pub(crate) fn builtin_not(args: &[Value]) -> Result<Value> {
    match args {
        [x] => Ok(Value::bool(!x.is_truthy())),
        _ => Err(Error::arity_named("not", 1, args.len())),
    }
}

pub(crate) fn builtin_nil_p(args: &[Value]) -> Result<Value> {
    match args {
        [x] => Ok(Value::bool(x.is_nil())),
        _ => Err(Error::arity_named("nil?", 1, args.len())),
    }
}

pub(crate) fn builtin_fn_p(args: &[Value]) -> Result<Value> {
    match args {
        [x] => Ok(Value::bool(x.is_fn())),
        _ => Err(Error::arity_named("fn?", 1, args.len())),
    }
}

// ============================================================================
// Strings and collections
// ============================================================================

/// Concatenate values; strings and chars print raw and nil prints as nothing.
pub(crate) fn builtin_str(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for arg in args {
        match arg {
            Value::Nil => {}
            Value::String(s) => out.push_str(s),
            Value::Char(c) => out.push(*c),
            other => out.push_str(&other.to_string()),
        }
    }
    Ok(Value::string(out))
}

pub(crate) fn builtin_list(args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.iter().cloned()))
}

pub(crate) fn builtin_vector(args: &[Value]) -> Result<Value> {
    Ok(Value::vector(args.iter().cloned()))
}

pub(crate) fn builtin_hash_map(args: &[Value]) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(Error::EvalError(
            "hash-map requires an even number of arguments".to_string(),
        ));
    }
    Ok(Value::map(
        args.chunks(2).map(|kv| (kv[0].clone(), kv[1].clone())),
    ))
}

pub(crate) fn builtin_count(args: &[Value]) -> Result<Value> {
    let [coll] = args else {
        return Err(Error::arity_named("count", 1, args.len()));
    };
    let n = match coll {
        Value::Nil => 0,
        Value::String(s) => s.chars().count(),
        Value::List(items) | Value::Vector(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::Set(set) => set.len(),
        other => return Err(Error::type_error_in("count", "collection", other.type_name())),
    };
    Ok(Value::int(n as i64))
}

pub(crate) fn builtin_first(args: &[Value]) -> Result<Value> {
    let [coll] = args else {
        return Err(Error::arity_named("first", 1, args.len()));
    };
    Ok(match coll {
        Value::Nil => Value::Nil,
        Value::List(items) | Value::Vector(items) => items.front().cloned().unwrap_or(Value::Nil),
        Value::Set(set) => set.get_min().cloned().unwrap_or(Value::Nil),
        Value::Map(map) => map
            .get_min()
            .map(|(k, v)| Value::vector([k.clone(), v.clone()]))
            .unwrap_or(Value::Nil),
        Value::String(s) => s.chars().next().map_or(Value::Nil, Value::char),
        other => return Err(Error::type_error_in("first", "collection", other.type_name())),
    })
}

/// (get coll key) / (get coll key default)
pub(crate) fn builtin_get(args: &[Value]) -> Result<Value> {
    let (coll, key, default) = match args {
        [coll, key] => (coll, key, Value::Nil),
        [coll, key, default] => (coll, key, default.clone()),
        _ => {
            return Err(Error::ArityError {
                expected: crate::error::AritySpec::Range(2, 3),
                got: args.len(),
                name: Some("get".to_string()),
            });
        }
    };
    let found = match (coll, key) {
        (Value::Map(map), key) => map.get(key).cloned(),
        (Value::Set(set), key) => set.contains(key).then(|| key.clone()),
        (Value::Vector(items), Value::Int(i)) => usize::try_from(*i).ok().and_then(|i| items.get(i).cloned()),
        _ => None,
    };
    Ok(found.unwrap_or(default))
}
