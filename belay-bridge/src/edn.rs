// belay-bridge - Data-notation reader namespace
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The `belay.edn` native namespace.
//!
//! `read-string` parses its argument as inert data: nothing is evaluated
//! and code-only reader syntax such as quote is rejected.

use belay_core::{Error, Namespace, NamespaceRegistry, Result, Value, make_native_fn};
use belay_reader::Parser;

pub const NAMESPACE: &str = "belay.edn";

/// Make `belay.edn` available to `require`.
pub fn register(registry: &NamespaceRegistry) {
    registry.register_native_module(NAMESPACE, install);
}

fn install(ns: &Namespace) -> Result<()> {
    ns.intern_with_value(
        "read-string",
        Value::NativeFn(make_native_fn("read-string", read_string)),
    );
    Ok(())
}

fn read_string(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(text)] => Ok(Parser::data(text)?.parse()?.unwrap_or(Value::Nil)),
        [other] => Err(Error::type_error_in("read-string", "string", other.type_name())),
        _ => Err(Error::arity_named("read-string", 1, args.len())),
    }
}

#[cfg(test)]
mod tests {
    use belay_core::{Keyword, standard_env};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_read_string() {
        assert_eq!(
            read_string(&[Value::string("[1 :a]")]).unwrap(),
            Value::vector([Value::int(1), Value::keyword(Keyword::new("a"))])
        );
        assert_eq!(read_string(&[Value::string("")]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_read_string_rejects_quote() {
        assert!(matches!(
            read_string(&[Value::string("'x")]),
            Err(Error::Read(_))
        ));
    }

    #[test]
    fn test_read_string_argument_errors() {
        assert!(read_string(&[]).is_err());
        assert!(read_string(&[Value::int(1)]).is_err());
    }

    #[test]
    fn test_installed_on_require() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        register(&registry);
        assert!(registry.find(NAMESPACE).is_none());

        belay_core::require(NAMESPACE, &env).unwrap();
        let var = registry.find(NAMESPACE).unwrap().find_var("read-string").unwrap();
        assert!(var.deref().unwrap().is_fn());
    }
}
