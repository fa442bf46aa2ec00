// belay-bridge - The Bridge
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Bridge struct - turns text and names into callable values.

use belay_core::{
    Env, NamespaceRegistry, Symbol, Value, apply, eval, eval_str, register_builtins, require,
};
use belay_reader::Parser;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::edn;
use crate::error::{BridgeError, Result};
use crate::producer::FnProducer;

/// Evaluates text, reads data and resolves functions against one runtime.
///
/// # Thread Safety
///
/// **`Bridge` is NOT thread-safe.** The runtime behind it uses `Rc` and
/// `RefCell`. Create one bridge per thread.
///
/// # Example
///
/// ```rust
/// use belay_bridge::Bridge;
/// use belay_core::Value;
///
/// let bridge = Bridge::new();
/// let f = bridge.evaluate_text("(fn [x] (* x 2))").unwrap();
/// assert_eq!(bridge.call(&f, &[Value::int(21)]).unwrap(), Value::int(42));
/// ```
pub struct Bridge {
    env: Env,
    registry: NamespaceRegistry,
    config: BridgeConfig,
}

impl Bridge {
    /// Create a bridge with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let registry = NamespaceRegistry::new();
        register_builtins(&registry);
        edn::register(&registry);
        registry.set_load_paths(config.load_paths.clone());
        for (ns, text) in &config.embedded_sources {
            registry.register_embedded_source(ns, text.as_str());
        }
        registry.set_max_eval_depth(config.max_eval_depth);

        Bridge {
            env: Env::with_registry(registry.clone()),
            registry,
            config,
        }
    }

    /// Read the first form of `text`, evaluate it, and return it if it is a
    /// function.
    pub fn evaluate_text(&self, text: &str) -> Result<Value> {
        let form = Parser::parse_str(text)?.unwrap_or(Value::Nil);
        let value = eval(&form, &self.env)?;
        if value.is_fn() {
            Ok(value)
        } else {
            Err(BridgeError::TextDidNotEvaluateToFunction {
                text: text.to_string(),
            })
        }
    }

    /// Read `text` as data through `belay.edn/read-string`.
    ///
    /// The reader namespace is loaded on first use.
    pub fn read_data(&self, text: &str) -> Result<Value> {
        require(edn::NAMESPACE, &self.env)?;
        let read_string = self
            .registry
            .find(edn::NAMESPACE)
            .and_then(|ns| ns.find_var("read-string"))
            .ok_or_else(|| BridgeError::not_invocable(edn::NAMESPACE, "read-string", None))?
            .deref()?;
        Ok(apply(&read_string, &[Value::string(text)])?)
    }

    /// Resolve `ns/name` to a function, loading `ns` if needed.
    ///
    /// A namespace that already holds a bound, non-nil `name` is used as
    /// is. Otherwise `ns` is required and the var looked up again.
    pub fn resolve_function(&self, ns: &str, name: &str) -> Result<Value> {
        let value = match self.lookup_loaded(ns, name) {
            Some(value) => {
                trace!(ns, name, "resolved without loading");
                Some(value)
            }
            None => {
                debug!(ns, name, "requiring namespace to resolve");
                self.require_and_lookup(ns, name)
                    .map_err(|e| BridgeError::not_invocable(ns, name, Some(e)))?
            }
        };

        match value {
            Some(value) if value.is_fn() => Ok(value),
            _ => Err(BridgeError::not_invocable(ns, name, None)),
        }
    }

    fn lookup_loaded(&self, ns: &str, name: &str) -> Option<Value> {
        self.registry
            .find(ns)?
            .resolve(&Symbol::new(name))?
            .root()
            .filter(|value| !value.is_nil())
    }

    fn require_and_lookup(&self, ns: &str, name: &str) -> belay_core::Result<Option<Value>> {
        require(ns, &self.env)?;
        Ok(self.registry.find_or_create(ns).intern(name).root())
    }

    /// Resolve `ns/name` and wrap it as a unit producer.
    pub fn producer(&self, ns: &str, name: &str) -> Result<FnProducer> {
        let func = self.resolve_function(ns, name)?;
        FnProducer::new(func).ok_or_else(|| BridgeError::not_invocable(ns, name, None))
    }

    /// Apply a function returned by this bridge.
    pub fn call(&self, func: &Value, args: &[Value]) -> Result<Value> {
        Ok(apply(func, args)?)
    }

    /// Evaluate every form in `source` and return the last value.
    pub fn eval(&self, source: &str) -> Result<Value> {
        Ok(eval_str(source, &self.env)?)
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    #[must_use]
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use belay_core::Keyword;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_evaluate_text_requires_function() {
        let bridge = Bridge::new();
        assert!(bridge.evaluate_text("(fn [] 42)").unwrap().is_fn());
        assert!(bridge.evaluate_text("inc").unwrap().is_fn());
        assert!(matches!(
            bridge.evaluate_text("42"),
            Err(BridgeError::TextDidNotEvaluateToFunction { text }) if text == "42"
        ));
    }

    #[test]
    fn test_evaluate_text_reads_first_form_only() {
        let bridge = Bridge::new();
        let f = bridge.evaluate_text("(fn [] :first) (def never 1)").unwrap();
        assert_eq!(bridge.call(&f, &[]).unwrap(), Value::keyword(Keyword::new("first")));
        assert!(bridge.registry().current().find_var("never").is_none());
    }

    #[test]
    fn test_evaluate_text_errors() {
        let bridge = Bridge::new();
        assert!(matches!(bridge.evaluate_text("(fn [] "), Err(BridgeError::Read(_))));
        assert!(matches!(bridge.evaluate_text("(nope)"), Err(BridgeError::Eval(_))));
    }

    #[test]
    fn test_fast_path_uses_refers() {
        let bridge = Bridge::with_config(
            BridgeConfig::default().embed("lib.a", "(ns lib.a) (defn f [] :a)"),
        );
        bridge
            .eval("(ns app (:require [lib.a :refer [f]]))")
            .unwrap();
        let loads = bridge.registry().load_count();
        assert!(bridge.resolve_function("app", "f").unwrap().is_fn());
        assert_eq!(bridge.registry().load_count(), loads);
    }

    #[test]
    fn test_depth_limit_stays_with_its_bridge() {
        let program = "(defn down [n] (if (= n 0) 0 (down (dec n)))) (down 100)";
        let roomy = Bridge::new();
        let tight = Bridge::with_config(BridgeConfig::default().max_eval_depth(40));

        assert_eq!(roomy.eval(program).unwrap(), Value::int(0));
        assert!(matches!(
            tight.eval(program),
            Err(BridgeError::Eval(belay_core::Error::DepthExceeded { max: 40 }))
        ));
        assert_eq!(roomy.registry().max_eval_depth(), belay_core::DEFAULT_MAX_EVAL_DEPTH);
    }

    #[test]
    fn test_nil_binding_is_not_invocable() {
        let bridge = Bridge::with_config(
            BridgeConfig::default().embed("cfg.vals", "(ns cfg.vals) (def off nil) (def n 1)"),
        );
        assert!(matches!(
            bridge.resolve_function("cfg.vals", "off"),
            Err(BridgeError::SymbolNotInvocable { source: None, .. })
        ));
        assert!(matches!(
            bridge.resolve_function("cfg.vals", "n"),
            Err(BridgeError::SymbolNotInvocable { .. })
        ));
    }
}
