// belay-reader - Value types
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Core value type.
//!
//! `Value` covers both plain data (what the reader produces) and the two
//! runtime-only function variants the evaluator creates. Function bodies and
//! native implementations are type-erased behind `Rc<dyn Any>` so this crate
//! stays independent of the evaluator.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use im::{OrdMap, OrdSet, Vector};
use num_bigint::BigInt;

use crate::keyword::Keyword;
use crate::symbol::Symbol;

/// A value: data produced by the reader, or a function produced by evaluation.
#[derive(Clone)]
pub enum Value {
    /// The nil value, representing nothing/absence
    Nil,
    /// Boolean true or false
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Arbitrary precision integer (overflowed literal or `N` suffix)
    BigInt(Rc<BigInt>),
    /// 64-bit floating point number
    Float(f64),
    /// Unicode character
    Char(char),
    /// Immutable string
    String(Rc<str>),
    /// Symbol (optionally namespaced identifier)
    Symbol(Symbol),
    /// Keyword (optionally namespaced, self-evaluating)
    Keyword(Keyword),
    /// List
    List(Vector<Value>),
    /// Indexed vector
    Vector(Vector<Value>),
    /// Ordered map
    Map(OrdMap<Value, Value>),
    /// Ordered set
    Set(OrdSet<Value>),
    /// User-defined function (closure)
    Fn(Function),
    /// Native (Rust) function
    NativeFn(NativeFn),
}

// ============================================================================
// Function Types
// ============================================================================

/// A single arity definition for a function.
#[derive(Clone, Debug)]
pub struct FnArity {
    /// Fixed parameter names
    pub params: Vec<Symbol>,
    /// Rest parameter name, if any (`& more`)
    pub rest_param: Option<Symbol>,
    /// Body expressions, evaluated in order
    pub body: Vec<Value>,
}

impl FnArity {
    /// Create a new arity definition.
    pub fn new(params: Vec<Symbol>, rest_param: Option<Symbol>, body: Vec<Value>) -> Self {
        FnArity {
            params,
            rest_param,
            body,
        }
    }

    /// Check if this arity accepts `count` arguments.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        if self.rest_param.is_some() {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }
}

/// A user-defined function with one or more arities.
#[derive(Clone)]
pub struct Function {
    /// Function name (for error messages and self-recursion)
    pub name: Option<Symbol>,
    /// One or more arity definitions
    pub arities: Rc<[FnArity]>,
    /// Captured environment (type-erased to avoid a dependency on the evaluator)
    pub env: Rc<dyn Any>,
}

impl Function {
    /// Create a new function.
    pub fn new(name: Option<Symbol>, arities: Vec<FnArity>, env: Rc<dyn Any>) -> Self {
        Function {
            name,
            arities: Rc::from(arities),
            env,
        }
    }

    /// Find the arity that matches the given argument count.
    /// Fixed arities win over a variadic one.
    pub fn find_arity(&self, arg_count: usize) -> Option<&FnArity> {
        self.arities
            .iter()
            .find(|a| a.rest_param.is_none() && a.params.len() == arg_count)
            .or_else(|| self.arities.iter().find(|a| a.accepts(arg_count)))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Fn(self.clone()))
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arities, &other.arities) && Rc::ptr_eq(&self.env, &other.env)
    }
}

/// A function implemented in Rust.
#[derive(Clone)]
pub struct NativeFn {
    /// Function name for display
    name: Rc<str>,
    /// The actual function (type-erased)
    func: Rc<dyn Any>,
}

impl NativeFn {
    /// Create a new native function with a type-erased implementation.
    pub fn new(name: impl Into<Rc<str>>, func: Rc<dyn Any>) -> Self {
        NativeFn {
            name: name.into(),
            func,
        }
    }

    /// Get the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the inner function reference.
    #[must_use]
    pub fn func(&self) -> &Rc<dyn Any> {
        &self.func
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<native-fn {}>", self.name)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

// ============================================================================
// Constructors and accessors
// ============================================================================

impl Value {
    pub fn nil() -> Self {
        Value::Nil
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn bigint(n: BigInt) -> Self {
        Value::BigInt(Rc::new(n))
    }

    pub fn float(n: f64) -> Self {
        Value::Float(n)
    }

    pub fn char(c: char) -> Self {
        Value::Char(c)
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn symbol(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }

    pub fn keyword(kw: Keyword) -> Self {
        Value::Keyword(kw)
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Vector(items.into_iter().collect())
    }

    /// Build a map. Later duplicate keys replace earlier ones.
    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(pairs.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    /// Everything except nil and false is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// True for values the evaluator can invoke as a plain function.
    #[must_use]
    pub fn is_fn(&self) -> bool {
        matches!(self, Value::Fn(_) | Value::NativeFn(_))
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Fn(_) | Value::NativeFn(_) => "fn",
        }
    }

    /// The elements of a list or vector.
    #[must_use]
    pub fn as_seq(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(items) | Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(sym) => Some(sym),
            _ => None,
        }
    }
}

// ============================================================================
// Printing
// ============================================================================

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &Vector<Value>, close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::BigInt(n) => write!(f, "{}N", n),
            Value::Float(n) if n.is_infinite() && n.is_sign_positive() => write!(f, "##Inf"),
            Value::Float(n) if n.is_infinite() => write!(f, "##-Inf"),
            Value::Float(n) if n.is_nan() => write!(f, "##NaN"),
            Value::Float(n) if n.fract() == 0.0 => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Char(c) => match c {
                '\n' => write!(f, "\\newline"),
                ' ' => write!(f, "\\space"),
                '\t' => write!(f, "\\tab"),
                '\r' => write!(f, "\\return"),
                c => write!(f, "\\{}", c),
            },
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(sym) => write!(f, "{}", sym),
            Value::Keyword(kw) => write!(f, "{}", kw),
            Value::List(items) => write_seq(f, "(", items, ")"),
            Value::Vector(items) => write_seq(f, "[", items, "]"),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Set(set) => {
                write!(f, "#{{")?;
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Fn(func) => match &func.name {
                Some(name) => write!(f, "#<fn {}>", name),
                None => write!(f, "#<fn>"),
            },
            Value::NativeFn(func) => write!(f, "#<native-fn {}>", func.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// ============================================================================
// Equality and ordering
// ============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numbers share a rank so heterogeneous numeric keys sort sensibly.
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Nil => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::BigInt(_) | Value::Float(_) => 2,
                Value::Char(_) => 3,
                Value::String(_) => 4,
                Value::Symbol(_) => 5,
                Value::Keyword(_) => 6,
                Value::List(_) | Value::Vector(_) => 7,
                Value::Map(_) => 8,
                Value::Set(_) => 9,
                Value::Fn(_) => 10,
                Value::NativeFn(_) => 11,
            }
        }

        let (ra, rb) = (rank(self), rank(other));
        if ra != rb {
            return ra.cmp(&rb);
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Int(a), Value::BigInt(b)) => BigInt::from(*a).cmp(b.as_ref()),
            (Value::BigInt(a), Value::Int(b)) => a.as_ref().cmp(&BigInt::from(*b)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::BigInt(a), Value::Float(b)) => {
                num_traits::ToPrimitive::to_f64(a.as_ref()).map_or(Ordering::Equal, |a| a.total_cmp(b))
            }
            (Value::Float(a), Value::BigInt(b)) => {
                num_traits::ToPrimitive::to_f64(b.as_ref()).map_or(Ordering::Equal, |b| a.total_cmp(&b))
            }
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
            (Value::Keyword(a), Value::Keyword(b)) => a.cmp(b),
            // Lists and vectors with equal elements are equal, as in Clojure.
            (Value::List(a) | Value::Vector(a), Value::List(b) | Value::Vector(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.iter().cmp(b.iter()),
            (Value::Set(a), Value::Set(b)) => a.iter().cmp(b.iter()),
            (Value::Fn(a), Value::Fn(b)) => {
                let pa = Rc::as_ptr(&a.arities).cast::<()>();
                let pb = Rc::as_ptr(&b.arities).cast::<()>();
                pa.cmp(&pb)
            }
            (Value::NativeFn(a), Value::NativeFn(b)) => {
                let pa = Rc::as_ptr(a.func()).cast::<()>();
                let pb = Rc::as_ptr(b.func()).cast::<()>();
                pa.cmp(&pb)
            }
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::bool(false).is_truthy());
        assert!(Value::int(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn test_list_equals_vector() {
        let list = Value::list([Value::int(1), Value::int(2)]);
        let vector = Value::vector([Value::int(1), Value::int(2)]);
        assert_eq!(list, vector);
    }

    #[test]
    fn test_numeric_equality_across_widths() {
        assert_eq!(Value::int(7), Value::bigint(BigInt::from(7)));
        assert_ne!(Value::int(7), Value::int(8));
    }

    #[test]
    fn test_map_display() {
        let map = Value::map([(Value::keyword(Keyword::new("a")), Value::int(1))]);
        assert_eq!(map.to_string(), "{:a 1}");
    }

    #[test]
    fn test_float_display() {
        assert_eq!(Value::float(1.0).to_string(), "1.0");
        assert_eq!(Value::float(2.5).to_string(), "2.5");
        assert_eq!(Value::float(f64::INFINITY).to_string(), "##Inf");
    }

    #[test]
    fn test_string_display_is_escaped() {
        assert_eq!(Value::string("a\"b").to_string(), "\"a\\\"b\"");
    }

    #[test]
    fn test_find_arity_prefers_fixed() {
        let env: Rc<dyn Any> = Rc::new(());
        let f = Function::new(
            None,
            vec![
                FnArity::new(vec![], Some(Symbol::new("more")), vec![]),
                FnArity::new(vec![Symbol::new("x")], None, vec![Value::int(1)]),
            ],
            env,
        );
        let arity = f.find_arity(1).map(|a| a.params.len());
        assert_eq!(arity, Some(1));
        assert!(f.find_arity(3).is_some_and(|a| a.rest_param.is_some()));
    }
}
