// belay-core - Environment for lexical scoping
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Environment for local bindings with lexical scoping.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use belay_reader::{Symbol, Value};

use crate::error::{Error, Result};
use crate::namespace::NamespaceRegistry;

/// A lexical environment for local bindings.
///
/// Environments form a chain through parent references. Only the root
/// holds the namespace registry; children reach it by walking up.
///
/// # Examples
///
/// ```
/// use belay_core::Env;
/// use belay_reader::{Symbol, Value};
///
/// let env = Env::new();
/// env.define(Symbol::new("x"), Value::int(42));
///
/// let child = env.child();
/// child.define(Symbol::new("x"), Value::int(100));
/// assert_eq!(child.lookup(&Symbol::new("x")), Some(Value::int(100)));
/// assert_eq!(env.lookup(&Symbol::new("x")), Some(Value::int(42)));
/// ```
#[derive(Debug, Clone)]
pub struct Env {
    inner: Rc<RefCell<EnvInner>>,
}

#[derive(Debug)]
struct EnvInner {
    bindings: HashMap<Symbol, Value>,
    parent: Option<Env>,
    /// Namespace registry (only set on the root environment)
    registry: Option<NamespaceRegistry>,
}

impl Env {
    /// Create a new root environment with a fresh registry.
    pub fn new() -> Self {
        Self::with_registry(NamespaceRegistry::new())
    }

    /// Create a root environment around an existing registry.
    pub fn with_registry(registry: NamespaceRegistry) -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: None,
                registry: Some(registry),
            })),
        }
    }

    /// Create a child environment with this environment as parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
                registry: None,
            })),
        }
    }

    /// Get the namespace registry from the root environment.
    /// Uses iterative traversal to avoid stack overflow on deep environments.
    pub fn registry(&self) -> Result<NamespaceRegistry> {
        let mut current = self.clone();
        loop {
            let parent = {
                let inner = current.inner.borrow();
                if let Some(registry) = &inner.registry {
                    return Ok(registry.clone());
                }
                inner.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => {
                    return Err(Error::Internal(
                        "Root environment missing namespace registry".to_string(),
                    ));
                }
            }
        }
    }

    /// Define a binding in this environment (not parent).
    pub fn define(&self, sym: Symbol, val: Value) {
        self.inner.borrow_mut().bindings.insert(sym, val);
    }

    /// Look up a symbol in this environment or its parent chain.
    #[must_use]
    pub fn lookup(&self, sym: &Symbol) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let inner = current.inner.borrow();
                if let Some(val) = inner.bindings.get(sym) {
                    return Some(val.clone());
                }
                inner.parent.clone()
            };
            current = parent?;
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
