// belay-core - Namespace system for global bindings
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Namespace system for managing global variable bindings.
//!
//! Namespaces organise Vars. Each namespace maps local names to Vars; the
//! `def` and `declare` special forms create Vars in the current namespace.
//! A namespace moves through three states: absent from the registry,
//! present but not loaded (created by `in-ns` or by a lookup), and loaded
//! (its module source has been evaluated by `require`).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use belay_reader::{Symbol, Value};

use crate::error::{Error, Result};
use crate::eval::DEFAULT_MAX_EVAL_DEPTH;
use crate::source::{EmbeddedSources, LoadPath, Module, ModuleSource, NativeModule, NativeModules};

// ============================================================================
// Var
// ============================================================================

/// A named, mutable slot in a namespace.
///
/// A Var starts unbound (after `declare`, or after being interned by a
/// lookup) and becomes bound when `def` gives it a root value. Clones share
/// the same slot.
#[derive(Clone)]
pub struct Var {
    inner: Rc<VarInner>,
}

struct VarInner {
    ns: Rc<str>,
    name: Rc<str>,
    root: RefCell<Option<Value>>,
}

impl Var {
    /// Create an unbound Var.
    pub fn new(ns: impl Into<Rc<str>>, name: impl Into<Rc<str>>) -> Self {
        Var {
            inner: Rc::new(VarInner {
                ns: ns.into(),
                name: name.into(),
                root: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn ns(&self) -> &str {
        &self.inner.ns
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The fully qualified name, e.g. `bench.core/run`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.inner.ns, self.inner.name)
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.root.borrow().is_some()
    }

    /// The root value, or `None` while unbound.
    #[must_use]
    pub fn root(&self) -> Option<Value> {
        self.inner.root.borrow().clone()
    }

    /// Give the Var a root value, replacing any previous one.
    pub fn bind(&self, value: Value) {
        *self.inner.root.borrow_mut() = Some(value);
    }

    /// Dereference the Var, failing if it is unbound.
    pub fn deref(&self) -> Result<Value> {
        self.root()
            .ok_or_else(|| Error::UnboundVar(self.qualified_name()))
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#'{}", self.qualified_name())
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// A namespace containing Var bindings.
#[derive(Debug, Clone)]
pub struct Namespace {
    inner: Rc<RefCell<NamespaceInner>>,
}

#[derive(Debug)]
struct NamespaceInner {
    name: Rc<str>,
    vars: HashMap<String, Var>,
    /// Aliases to other namespaces (for require :as)
    aliases: HashMap<String, Namespace>,
    /// Vars referred from other namespaces (for require :refer)
    refers: HashMap<String, Var>,
}

impl Namespace {
    /// Create a new namespace with the given name.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Namespace {
            inner: Rc::new(RefCell::new(NamespaceInner {
                name: name.into(),
                vars: HashMap::new(),
                aliases: HashMap::new(),
                refers: HashMap::new(),
            })),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Rc<str> {
        self.inner.borrow().name.clone()
    }

    /// Intern a Var with the given name, creating it unbound if it doesn't
    /// exist. Returns the existing Var if one already exists.
    pub fn intern(&self, name: &str) -> Var {
        let mut inner = self.inner.borrow_mut();
        if let Some(var) = inner.vars.get(name) {
            return var.clone();
        }
        let var = Var::new(inner.name.clone(), name);
        inner.vars.insert(name.to_string(), var.clone());
        var
    }

    /// Intern a Var and bind its root.
    pub fn intern_with_value(&self, name: &str, value: Value) -> Var {
        let var = self.intern(name);
        var.bind(value);
        var
    }

    /// Look up a Var by name in this namespace.
    /// Does not check refers or aliases.
    #[inline]
    #[must_use]
    pub fn find_var(&self, name: &str) -> Option<Var> {
        self.inner.borrow().vars.get(name).cloned()
    }

    /// Resolve a symbol to a Var, checking local vars, then refers.
    /// Qualified symbols are resolved through aliases only.
    #[must_use]
    pub fn resolve(&self, sym: &Symbol) -> Option<Var> {
        let inner = self.inner.borrow();
        if let Some(ns_name) = sym.namespace() {
            return inner.aliases.get(ns_name)?.find_var(sym.name());
        }
        inner
            .vars
            .get(sym.name())
            .or_else(|| inner.refers.get(sym.name()))
            .cloned()
    }

    /// Add an alias for another namespace.
    pub fn add_alias(&self, alias: impl Into<String>, ns: Namespace) {
        self.inner.borrow_mut().aliases.insert(alias.into(), ns);
    }

    /// Refer another namespace's Var under a local name.
    pub fn refer(&self, name: impl Into<String>, var: Var) {
        self.inner.borrow_mut().refers.insert(name.into(), var);
    }

    /// All Vars interned in this namespace.
    #[must_use]
    pub fn interns(&self) -> HashMap<String, Var> {
        self.inner.borrow().vars.clone()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registry of all namespaces, plus the module sources `require` consults.
///
/// Cloning the registry shares it.
#[derive(Clone)]
pub struct NamespaceRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

struct RegistryInner {
    namespaces: HashMap<String, Namespace>,
    current: Rc<str>,
    /// Namespaces whose module has been evaluated
    loaded: HashSet<String>,
    /// Namespaces currently being loaded, for cycle detection
    loading: HashSet<String>,
    /// Number of modules actually evaluated by `require`
    load_count: usize,
    native: NativeModules,
    embedded: EmbeddedSources,
    load_path: LoadPath,
    /// Sources consulted after the built-in ones
    extra_sources: Vec<Rc<dyn ModuleSource>>,
    max_eval_depth: usize,
}

impl NamespaceRegistry {
    /// The namespace holding the builtins.
    pub const CORE_NS: &'static str = "belay.core";
    /// The namespace that is current on startup.
    pub const USER_NS: &'static str = "user";

    /// Create a new registry with `belay.core` and `user` namespaces.
    /// `user` is set as current.
    pub fn new() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert(Self::CORE_NS.to_string(), Namespace::new(Self::CORE_NS));
        namespaces.insert(Self::USER_NS.to_string(), Namespace::new(Self::USER_NS));

        NamespaceRegistry {
            inner: Rc::new(RefCell::new(RegistryInner {
                namespaces,
                current: Rc::from(Self::USER_NS),
                loaded: HashSet::from([Self::CORE_NS.to_string()]),
                loading: HashSet::new(),
                load_count: 0,
                native: NativeModules::default(),
                embedded: EmbeddedSources::default(),
                load_path: LoadPath::default(),
                extra_sources: Vec::new(),
                max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            })),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Namespaces
    // ─────────────────────────────────────────────────────────────────────────

    /// Find a namespace by name, returning None if it doesn't exist.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Namespace> {
        self.inner.borrow().namespaces.get(name).cloned()
    }

    /// Find a namespace by name, or create it if it doesn't exist.
    pub fn find_or_create(&self, name: &str) -> Namespace {
        let mut inner = self.inner.borrow_mut();
        inner
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name))
            .clone()
    }

    /// The builtins namespace.
    pub fn core(&self) -> Namespace {
        self.find_or_create(Self::CORE_NS)
    }

    /// Get the current namespace.
    pub fn current(&self) -> Namespace {
        let name = self.current_name();
        self.find_or_create(&name)
    }

    #[must_use]
    pub fn current_name(&self) -> Rc<str> {
        self.inner.borrow().current.clone()
    }

    /// Set the current namespace by name, creating it if necessary.
    pub fn set_current(&self, name: &str) -> Namespace {
        let ns = self.find_or_create(name);
        self.inner.borrow_mut().current = ns.name();
        ns
    }

    /// Resolve a symbol to a Var from the current namespace.
    ///
    /// Unqualified symbols check the current namespace (vars, then refers)
    /// and fall back to `belay.core`. Qualified symbols check aliases of
    /// the current namespace, then the named namespace itself.
    #[must_use]
    pub fn resolve(&self, sym: &Symbol) -> Option<Var> {
        let current = self.current();
        if let Some(var) = current.resolve(sym) {
            return Some(var);
        }
        match sym.namespace() {
            Some(ns_name) => self.find(ns_name)?.find_var(sym.name()),
            None => self.find(Self::CORE_NS)?.find_var(sym.name()),
        }
    }

    /// Maximum nesting of `eval` calls for environments using this registry.
    #[must_use]
    pub fn max_eval_depth(&self) -> usize {
        self.inner.borrow().max_eval_depth
    }

    /// Returns the previous limit.
    pub fn set_max_eval_depth(&self, depth: usize) -> usize {
        std::mem::replace(&mut self.inner.borrow_mut().max_eval_depth, depth)
    }

    /// List all namespace names.
    #[must_use]
    pub fn all_ns(&self) -> Vec<String> {
        self.inner.borrow().namespaces.keys().cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Load Tracking
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if a namespace's module has been loaded.
    #[must_use]
    pub fn is_loaded(&self, ns_name: &str) -> bool {
        self.inner.borrow().loaded.contains(ns_name)
    }

    /// How many modules `require` has evaluated so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.inner.borrow().load_count
    }

    /// Record that loading `ns_name` has started.
    /// Fails if it is already in progress, which means the modules form a
    /// require cycle.
    pub(crate) fn begin_load(&self, ns_name: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.loading.insert(ns_name.to_string()) {
            return Err(Error::EvalError(format!(
                "Cyclic load dependency: {} is already being loaded",
                ns_name
            )));
        }
        Ok(())
    }

    /// Record that loading `ns_name` has finished, successfully or not.
    pub(crate) fn end_load(&self, ns_name: &str, succeeded: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.loading.remove(ns_name);
        if succeeded {
            inner.loaded.insert(ns_name.to_string());
            inner.load_count += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Module Sources
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a native module: a Rust installer run against the
    /// namespace when it is first required.
    pub fn register_native_module(
        &self,
        ns_name: &str,
        installer: impl Fn(&Namespace) -> Result<()> + 'static,
    ) {
        let installer: NativeModule = Rc::new(installer);
        self.inner.borrow_mut().native.insert(ns_name, installer);
    }

    /// Register in-memory source text for a namespace.
    pub fn register_embedded_source(&self, ns_name: &str, source: impl Into<Rc<str>>) {
        self.inner.borrow_mut().embedded.insert(ns_name, source.into());
    }

    /// Add a module source consulted after native modules, embedded
    /// sources and load paths.
    pub fn add_module_source(&self, source: Rc<dyn ModuleSource>) {
        self.inner.borrow_mut().extra_sources.push(source);
    }

    #[must_use]
    pub fn load_paths(&self) -> Vec<PathBuf> {
        self.inner.borrow().load_path.paths().to_vec()
    }

    pub fn add_load_path(&self, path: impl Into<PathBuf>) {
        self.inner.borrow_mut().load_path.push(path.into());
    }

    /// Set the load paths (replaces existing).
    pub fn set_load_paths(&self, paths: Vec<PathBuf>) {
        self.inner.borrow_mut().load_path.set(paths);
    }

    /// Find the module for a namespace, consulting native modules, embedded
    /// sources, load paths and then any added sources, in that order.
    pub fn locate(&self, ns_name: &str) -> Result<Option<Module>> {
        let extra = {
            let inner = self.inner.borrow();
            let builtin: [&dyn ModuleSource; 3] =
                [&inner.native, &inner.embedded, &inner.load_path];
            for source in builtin {
                if let Some(module) = source.locate(ns_name)? {
                    return Ok(Some(module));
                }
            }
            inner.extra_sources.clone()
        };
        // Added sources run without the registry borrowed.
        for source in extra {
            if let Some(module) = source.locate(ns_name)? {
                return Ok(Some(module));
            }
        }
        Ok(None)
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("NamespaceRegistry")
            .field("current", &inner.current)
            .field("namespaces", &inner.namespaces.len())
            .field("loaded", &inner.loaded)
            .finish_non_exhaustive()
    }
}
