// belay-core - Namespace special forms and require
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `ns`, `in-ns` and `require`, plus the module loading behind them.

use belay_reader::{Parser, Symbol, Value};
use tracing::{debug, trace};

use super::{eval, eval_body};
use crate::env::Env;
use crate::error::{Error, Result};
use crate::namespace::NamespaceRegistry;
use crate::source::Module;

/// Load the module for `ns_name` unless it is already loaded.
///
/// The module is located through the registry's module sources. Source
/// modules are evaluated in a fresh root environment with `ns_name` as the
/// current namespace; the caller's current namespace is restored afterwards
/// whether or not loading succeeded.
pub fn require(ns_name: &str, env: &Env) -> Result<()> {
    let registry = env.registry()?;
    if registry.is_loaded(ns_name) {
        trace!(ns = ns_name, "namespace already loaded");
        return Ok(());
    }

    let module = registry
        .locate(ns_name)?
        .ok_or_else(|| Error::NamespaceNotFound(ns_name.to_string()))?;

    registry.begin_load(ns_name)?;
    let result = load_module(ns_name, module, &registry);
    registry.end_load(ns_name, result.is_ok());

    result.map_err(|source| Error::ModuleLoad {
        ns: ns_name.to_string(),
        source: Box::new(source),
    })
}

fn load_module(ns_name: &str, module: Module, registry: &NamespaceRegistry) -> Result<()> {
    match module {
        Module::Native(install) => {
            debug!(ns = ns_name, "installing native module");
            install(&registry.find_or_create(ns_name))
        }
        Module::Source { origin, text } => {
            debug!(ns = ns_name, %origin, "loading namespace");
            let forms = Parser::parse_all_str(&text)?;

            let original = registry.current_name();
            registry.set_current(ns_name);
            let module_env = Env::with_registry(registry.clone());
            let result = eval_body(&forms, &module_env);
            registry.set_current(&original);

            result.map(|_| ())
        }
    }
}

/// (in-ns 'name)
pub(crate) fn eval_in_ns(args: &[Value], env: &Env) -> Result<Value> {
    let [arg] = args else {
        return Err(Error::syntax("in-ns", "requires exactly 1 argument"));
    };
    let name = namespace_name("in-ns", &eval(arg, env)?)?;
    let ns = env.registry()?.set_current(&name);
    Ok(Value::symbol(Symbol::new(&ns.name())))
}

/// (ns name (:require spec...)*)
///
/// Neither the name nor the clauses are evaluated.
pub(crate) fn eval_ns(args: &[Value], env: &Env) -> Result<Value> {
    let Some((Value::Symbol(name), clauses)) = args.split_first() else {
        return Err(Error::syntax("ns", "requires a namespace name symbol"));
    };
    let registry = env.registry()?;
    registry.set_current(name.name());

    for clause in clauses {
        let items: Vec<Value> = match clause.as_seq() {
            Some(items) => items.iter().cloned().collect(),
            None => continue,
        };
        match items.split_first() {
            Some((Value::Keyword(kw), specs)) if kw.name() == "require" => {
                for spec in specs {
                    require_spec(spec, env)?;
                }
            }
            Some((Value::Keyword(kw), _)) => {
                return Err(Error::syntax("ns", format!("unsupported clause :{}", kw.name())));
            }
            // Docstrings and metadata maps are not lists.
            _ => {}
        }
    }
    Ok(Value::Nil)
}

/// (require 'a.b '[c.d :as d :refer [f g]])
pub(crate) fn eval_require(args: &[Value], env: &Env) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::syntax("require", "requires at least 1 argument"));
    }
    for arg in args {
        require_spec(&eval(arg, env)?, env)?;
    }
    Ok(Value::Nil)
}

/// Require one spec and apply its `:as` and `:refer` options to the
/// current namespace.
fn require_spec(spec: &Value, env: &Env) -> Result<()> {
    let (ns_name, options) = match spec {
        Value::Symbol(sym) => (sym.name().to_string(), Vec::new()),
        Value::Vector(items) if !items.is_empty() => {
            let items: Vec<Value> = items.iter().cloned().collect();
            (namespace_name("require", &items[0])?, items[1..].to_vec())
        }
        other => {
            return Err(Error::syntax(
                "require",
                format!("expected a symbol or vector spec, got {}", other.type_name()),
            ));
        }
    };

    let registry = env.registry()?;
    // The caller's namespace, captured before loading can create others.
    let current = registry.current();
    require(&ns_name, env)?;
    let target = registry
        .find(&ns_name)
        .ok_or_else(|| Error::NamespaceNotFound(ns_name.clone()))?;

    for option in options.chunks(2) {
        match option {
            [Value::Keyword(kw), Value::Symbol(alias)] if kw.name() == "as" => {
                current.add_alias(alias.name(), target.clone());
            }
            [Value::Keyword(kw), Value::Vector(names)] if kw.name() == "refer" => {
                for name in names {
                    let Value::Symbol(sym) = name else {
                        return Err(Error::syntax("require", ":refer expects symbols"));
                    };
                    let var = target.find_var(sym.name()).ok_or_else(|| {
                        Error::UndefinedSymbol(Symbol::with_namespace(&ns_name, sym.name()))
                    })?;
                    current.refer(sym.name(), var);
                }
            }
            other => {
                return Err(Error::syntax(
                    "require",
                    format!("unsupported option {}", Value::vector(other.iter().cloned())),
                ));
            }
        }
    }
    Ok(())
}

fn namespace_name(form: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::Symbol(sym) => Ok(sym.name().to_string()),
        Value::String(s) => Ok(s.to_string()),
        other => Err(Error::syntax(
            form,
            format!("namespace must be a symbol or string, got {}", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval_str;
    use crate::standard_env;

    #[test]
    fn test_require_embedded_counts_one_load() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        registry.register_embedded_source("lib.math", "(ns lib.math) (defn twice [x] (* 2 x))");

        eval_str("(require 'lib.math)", &env).unwrap();
        eval_str("(require 'lib.math)", &env).unwrap();

        assert_eq!(registry.load_count(), 1);
        assert_eq!(&*registry.current_name(), "user");
        assert_eq!(eval_str("(lib.math/twice 4)", &env).unwrap(), Value::int(8));
    }

    #[test]
    fn test_require_alias_and_refer() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        registry.register_embedded_source("lib.text", "(defn shout [s] (str s \"!\"))");

        eval_str("(require '[lib.text :as t :refer [shout]])", &env).unwrap();
        assert_eq!(eval_str("(t/shout \"a\")", &env).unwrap(), Value::string("a!"));
        assert_eq!(eval_str("(shout \"b\")", &env).unwrap(), Value::string("b!"));
    }

    #[test]
    fn test_require_missing_namespace() {
        let env = standard_env();
        let err = require("no.such.ns", &env).unwrap_err();
        assert!(matches!(err, Error::NamespaceNotFound(ns) if ns == "no.such.ns"));
    }

    #[test]
    fn test_failed_load_restores_namespace_and_can_retry() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        registry.register_embedded_source("lib.bad", "(ns lib.bad) (def ok 1) (undefined-fn)");

        let err = require("lib.bad", &env).unwrap_err();
        assert!(matches!(err, Error::ModuleLoad { ref ns, .. } if ns == "lib.bad"));
        assert_eq!(&*registry.current_name(), "user");
        assert!(!registry.is_loaded("lib.bad"));

        registry.register_embedded_source("lib.bad", "(ns lib.bad) (def ok 2)");
        require("lib.bad", &env).unwrap();
        assert_eq!(eval_str("lib.bad/ok", &env).unwrap(), Value::int(2));
    }

    #[test]
    fn test_cyclic_require_fails() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        registry.register_embedded_source("cyc.a", "(ns cyc.a (:require cyc.b))");
        registry.register_embedded_source("cyc.b", "(ns cyc.b (:require cyc.a))");

        assert!(require("cyc.a", &env).is_err());
        assert!(!registry.is_loaded("cyc.a"));
        assert!(!registry.is_loaded("cyc.b"));
    }

    #[test]
    fn test_native_module() {
        let env = standard_env();
        let registry = env.registry().unwrap();
        registry.register_native_module("host.info", |ns| {
            ns.intern_with_value("version", Value::int(3));
            Ok(())
        });

        require("host.info", &env).unwrap();
        assert_eq!(eval_str("host.info/version", &env).unwrap(), Value::int(3));
        assert_eq!(registry.load_count(), 1);
    }

    #[test]
    fn test_in_ns_switches_current() {
        let env = standard_env();
        assert_eq!(
            eval_str("(in-ns 'scratch)", &env).unwrap(),
            Value::symbol(Symbol::new("scratch"))
        );
        eval_str("(def y 5)", &env).unwrap();
        assert!(env.registry().unwrap().find("scratch").unwrap().find_var("y").is_some());
    }
}
