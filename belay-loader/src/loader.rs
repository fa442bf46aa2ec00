// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The delegating loader and its parents.
//!
//! A [`DelegatingLoader`] asks its [`Producer`] for the bytes of a unit.
//! Produced bytes are defined in the host registry together with the
//! unit's containing package; anything the producer declines goes to the
//! parent loader unchanged.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{DefineError, LoadError, PackageError, ProducerError};
use crate::registry::{HostRegistry, Package};
use crate::unit::{Unit, package_of};

// =============================================================================
// Producers
// =============================================================================

/// What a producer returns for one name.
pub type Produced = Result<Option<Vec<u8>>, ProducerError>;

/// Supplies unit bytes by name.
///
/// `Ok(None)` means "not mine": the loader delegates to its parent.
pub trait Producer {
    fn produce(&self, name: &str) -> Produced;
}

impl<F> Producer for F
where
    F: Fn(&str) -> Produced,
{
    fn produce(&self, name: &str) -> Produced {
        self(name)
    }
}

/// A producer answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct MapProducer {
    units: HashMap<String, Vec<u8>>,
}

impl MapProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.units.insert(name.into(), bytes);
    }

    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl Producer for MapProducer {
    fn produce(&self, name: &str) -> Produced {
        Ok(self.units.get(name).cloned())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// What a loader does when its producer fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProducerFailurePolicy {
    /// Log and treat the name as "not mine".
    #[default]
    Decline,
    /// Fail the load with [`LoadError::ProducerFailed`].
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub producer_failure: ProducerFailurePolicy,
    /// Whether [`DelegatingLoader::load`] links eagerly.
    pub link_on_load: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            producer_failure: ProducerFailurePolicy::Decline,
            link_on_load: true,
        }
    }
}

impl LoaderConfig {
    pub fn producer_failure(mut self, policy: ProducerFailurePolicy) -> Self {
        self.producer_failure = policy;
        self
    }

    pub fn link_on_load(mut self, link: bool) -> Self {
        self.link_on_load = link;
        self
    }
}

// =============================================================================
// Parents
// =============================================================================

/// Anything a loader can delegate to.
pub trait ParentLoader {
    fn load_unit(&self, name: &str, resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError>;
}

/// Knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLoader;

impl ParentLoader for EmptyLoader {
    fn load_unit(&self, name: &str, _resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError> {
        Err(LoadError::not_found(name))
    }
}

/// A fixed set of units available from startup, optionally backed by
/// another parent.
pub struct BootLoader {
    units: HashMap<String, Rc<Unit>>,
    parent: Option<Box<dyn ParentLoader>>,
}

impl BootLoader {
    pub fn new() -> Self {
        BootLoader {
            units: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(parent: impl ParentLoader + 'static) -> Self {
        BootLoader {
            units: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Decode and add a unit.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<Rc<Unit>, DefineError> {
        if self.units.contains_key(name) {
            return Err(DefineError::Duplicate {
                name: name.to_string(),
            });
        }
        let unit = Rc::new(Unit::decode(name, bytes)?);
        self.units.insert(name.to_string(), Rc::clone(&unit));
        Ok(unit)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }
}

impl Default for BootLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BootLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.units.keys().collect();
        names.sort();
        f.debug_struct("BootLoader")
            .field("units", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl ParentLoader for BootLoader {
    fn load_unit(&self, name: &str, resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError> {
        match self.units.get(name) {
            Some(unit) => {
                if resolve_eagerly {
                    link(unit)?;
                }
                Ok(Rc::clone(unit))
            }
            None => match &self.parent {
                Some(parent) => parent.load_unit(name, resolve_eagerly),
                None => Err(LoadError::not_found(name)),
            },
        }
    }
}

fn link(unit: &Unit) -> Result<(), LoadError> {
    unit.link().map_err(|source| LoadError::Link {
        name: unit.name().to_string(),
        source,
    })
}

// =============================================================================
// Delegating loader
// =============================================================================

/// Outcome of asking the producer.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    Produced(Vec<u8>),
    Delegate,
}

/// Loader that defines produced units and delegates everything else.
pub struct DelegatingLoader {
    producer: Box<dyn Producer>,
    parent: Box<dyn ParentLoader>,
    registry: Rc<dyn HostRegistry>,
    config: LoaderConfig,
    defined: RefCell<BTreeMap<String, Rc<Unit>>>,
}

impl DelegatingLoader {
    pub fn new(
        producer: impl Producer + 'static,
        parent: impl ParentLoader + 'static,
        registry: Rc<dyn HostRegistry>,
    ) -> Self {
        Self::with_config(producer, parent, registry, LoaderConfig::default())
    }

    pub fn with_config(
        producer: impl Producer + 'static,
        parent: impl ParentLoader + 'static,
        registry: Rc<dyn HostRegistry>,
        config: LoaderConfig,
    ) -> Self {
        DelegatingLoader {
            producer: Box::new(producer),
            parent: Box::new(parent),
            registry,
            config,
            defined: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> LoaderConfig {
        self.config
    }

    pub fn registry(&self) -> &Rc<dyn HostRegistry> {
        &self.registry
    }

    /// Load `name`, linking according to [`LoaderConfig::link_on_load`].
    pub fn load(&self, name: &str) -> Result<Rc<Unit>, LoadError> {
        self.load_unit(name, self.config.link_on_load)
    }

    /// Resolve `name` to a unit.
    ///
    /// Units this loader already defined are returned as-is. Otherwise the
    /// producer is consulted; declined names are loaded by the parent.
    pub fn load_unit(&self, name: &str, resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError> {
        if let Some(unit) = self.find_loaded(name) {
            trace!(unit = name, "already defined by this loader");
            if resolve_eagerly {
                link(&unit)?;
            }
            return Ok(unit);
        }

        match self.lookup(name)? {
            Lookup::Delegate => {
                debug!(unit = name, "delegating to parent");
                self.parent.load_unit(name, resolve_eagerly)
            }
            Lookup::Produced(bytes) => self.define(name, &bytes, resolve_eagerly),
        }
    }

    /// Ask the producer about `name`, applying the failure policy.
    pub fn lookup(&self, name: &str) -> Result<Lookup, LoadError> {
        match self.producer.produce(name) {
            Ok(Some(bytes)) => Ok(Lookup::Produced(bytes)),
            Ok(None) => Ok(Lookup::Delegate),
            Err(source) => match self.config.producer_failure {
                ProducerFailurePolicy::Decline => {
                    warn!(unit = name, error = %source, "producer failed; delegating");
                    Ok(Lookup::Delegate)
                }
                ProducerFailurePolicy::Propagate => Err(LoadError::ProducerFailed {
                    name: name.to_string(),
                    source,
                }),
            },
        }
    }

    /// Define produced bytes as `name`.
    ///
    /// With `resolve_eagerly`, a unit that fails to link is never defined
    /// and its package is left alone.
    fn define(&self, name: &str, bytes: &[u8], resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError> {
        if resolve_eagerly {
            link(&Unit::decode(name, bytes)?)?;
        }

        let unit = self.registry.define_unit(name, bytes)?;
        if resolve_eagerly {
            link(&unit)?;
        }
        debug!(unit = name, linked = unit.is_linked(), "defined produced unit");
        self.defined
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&unit));

        if let Some(package) = package_of(name) {
            self.ensure_package(package);
        }
        Ok(unit)
    }

    /// Register `package` unless the registry already has it.
    fn ensure_package(&self, package: &str) {
        if self.registry.find_package(package).is_some() {
            trace!(package = %package, "package already present");
            return;
        }
        match self.registry.register_package(Package::unsealed(package)) {
            Ok(()) => debug!(package = %package, "registered package"),
            Err(PackageError::AlreadyRegistered { .. }) => {
                trace!(package = %package, "package registered concurrently");
            }
        }
    }

    /// A unit previously defined by this loader.
    pub fn find_loaded(&self, name: &str) -> Option<Rc<Unit>> {
        self.defined.borrow().get(name).cloned()
    }

    /// Names of every unit this loader has defined, sorted.
    pub fn defined_names(&self) -> Vec<String> {
        self.defined.borrow().keys().cloned().collect()
    }
}

impl ParentLoader for DelegatingLoader {
    fn load_unit(&self, name: &str, resolve_eagerly: bool) -> Result<Rc<Unit>, LoadError> {
        DelegatingLoader::load_unit(self, name, resolve_eagerly)
    }
}

impl fmt::Debug for DelegatingLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingLoader")
            .field("config", &self.config)
            .field("defined", &self.defined_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{LocalRegistry, OpCode, UnitBuilder};

    fn bytes(name: &str) -> Vec<u8> {
        let mut b = UnitBuilder::new(name);
        b.emit(OpCode::True).emit(OpCode::Return);
        b.encode()
    }

    fn loader(producer: impl Producer + 'static) -> (DelegatingLoader, Rc<LocalRegistry>) {
        let registry = LocalRegistry::shared();
        let loader = DelegatingLoader::new(producer, EmptyLoader, registry.clone());
        (loader, registry)
    }

    #[test]
    fn test_closure_producer() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let (loader, registry) = loader(move |name: &str| -> Produced {
            seen.set(seen.get() + 1);
            Ok(name.starts_with("gen.").then(|| bytes(name)))
        });

        let unit = loader.load_unit("gen.Thing", true).unwrap();
        assert!(unit.is_linked());
        assert_eq!(registry.package_names(), vec!["gen".to_string()]);

        // Second load is answered without asking the producer
        let again = loader.load_unit("gen.Thing", false).unwrap();
        assert!(Rc::ptr_eq(&unit, &again));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_lazy_then_eager_link() {
        let (loader, _) = loader(MapProducer::new().with("a.B", bytes("a.B")));
        let unit = loader.load_unit("a.B", false).unwrap();
        assert!(!unit.is_linked());
        loader.load_unit("a.B", true).unwrap();
        assert!(unit.is_linked());
    }

    #[test]
    fn test_declined_failure_delegates() {
        let (loader, _) = loader(|_: &str| -> Produced { Err(ProducerError::new("boom")) });
        assert_eq!(loader.lookup("a.B").unwrap(), Lookup::Delegate);
        assert!(matches!(
            loader.load_unit("a.B", false),
            Err(LoadError::UnitNotFound { name }) if name == "a.B"
        ));
    }

    #[test]
    fn test_propagated_failure() {
        let loader = DelegatingLoader::with_config(
            |_: &str| -> Produced { Err(ProducerError::new("boom")) },
            EmptyLoader,
            LocalRegistry::shared(),
            LoaderConfig::default().producer_failure(ProducerFailurePolicy::Propagate),
        );
        let err = loader.load_unit("a.B", false).unwrap_err();
        assert!(matches!(err, LoadError::ProducerFailed { ref name, .. } if name == "a.B"));
        assert!(err.is_not_found());
    }

    fn unlinkable(name: &str) -> Vec<u8> {
        let mut b = UnitBuilder::new(name);
        b.emit(OpCode::Return);
        b.encode()
    }

    #[test]
    fn test_eager_link_failure_defines_nothing() {
        let (loader, registry) = loader(MapProducer::new().with("bad.Unit", unlinkable("bad.Unit")));

        assert!(matches!(
            loader.load_unit("bad.Unit", true),
            Err(LoadError::Link { ref name, .. }) if name == "bad.Unit"
        ));
        assert!(registry.find_unit("bad.Unit").is_none());
        assert!(registry.find_package("bad").is_none());
        assert!(loader.defined_names().is_empty());

        // Nothing was defined, so a lazy load can still define it
        let unit = loader.load_unit("bad.Unit", false).unwrap();
        assert!(!unit.is_linked());
        assert_eq!(registry.package_names(), vec!["bad".to_string()]);
    }

    #[test]
    fn test_lazy_unit_link_failure_keeps_definition() {
        let (loader, registry) = loader(MapProducer::new().with("bad.Unit", unlinkable("bad.Unit")));
        let unit = loader.load_unit("bad.Unit", false).unwrap();

        assert!(matches!(
            loader.load_unit("bad.Unit", true),
            Err(LoadError::Link { .. })
        ));
        // The defined unit is still the one served, never redefined
        assert!(Rc::ptr_eq(&unit, &registry.find_unit("bad.Unit").unwrap()));
        assert!(!unit.is_linked());
        assert_eq!(registry.unit_count(), 1);
        assert!(Rc::ptr_eq(&unit, &loader.load_unit("bad.Unit", false).unwrap()));
    }

    #[test]
    fn test_existing_package_is_not_registered_again() {
        let registry = LocalRegistry::shared();
        registry.register_package(Package::unsealed("pre")).unwrap();
        let producer = |name: &str| -> Produced { Ok(Some(bytes(name))) };
        let loader = DelegatingLoader::new(producer, EmptyLoader, registry.clone());

        loader.load_unit("pre.A", true).unwrap();
        loader.load_unit("pre.B", true).unwrap();
        assert_eq!(registry.package_names(), vec!["pre".to_string()]);
    }

    #[test]
    fn test_boot_loader_chain() {
        let mut outer = BootLoader::new();
        outer.add("host.Outer", &bytes("host.Outer")).unwrap();
        let mut boot = BootLoader::with_parent(outer);
        boot.add("host.Inner", &bytes("host.Inner")).unwrap();
        assert!(boot.add("host.Inner", &bytes("host.Inner")).is_err());

        assert!(boot.load_unit("host.Inner", true).unwrap().is_linked());
        assert!(!boot.load_unit("host.Outer", false).unwrap().is_linked());
        assert!(boot.load_unit("host.Missing", false).is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = LoaderConfig::default()
            .link_on_load(false)
            .producer_failure(ProducerFailurePolicy::Propagate);
        assert!(!config.link_on_load);
        assert_eq!(config.producer_failure, ProducerFailurePolicy::Propagate);
        assert_eq!(LoaderConfig::default().producer_failure, ProducerFailurePolicy::Decline);
    }
}
