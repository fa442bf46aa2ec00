// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The host's defined-unit and package registries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::{DefineError, PackageError};
use crate::unit::Unit;

/// Package metadata attached to a containing-package name.
///
/// Packages created by the loader carry only a name; every descriptive
/// field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub spec_title: String,
    pub spec_version: String,
    pub spec_vendor: String,
    pub impl_title: String,
    pub impl_version: String,
    pub impl_vendor: String,
    pub seal_base: String,
}

impl Package {
    /// A package with the given name and empty metadata.
    pub fn unsealed(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            ..Package::default()
        }
    }
}

/// The host's loading graph, as seen by loaders.
///
/// Each unit name is defined at most once, and each package is registered
/// at most once.
pub trait HostRegistry {
    /// Decode and define `bytes` as unit `name`.
    fn define_unit(&self, name: &str, bytes: &[u8]) -> Result<Rc<Unit>, DefineError>;

    fn find_unit(&self, name: &str) -> Option<Rc<Unit>>;

    fn register_package(&self, package: Package) -> Result<(), PackageError>;

    fn find_package(&self, name: &str) -> Option<Package>;
}

/// In-process [`HostRegistry`] backed by hash maps.
#[derive(Debug, Default)]
pub struct LocalRegistry {
    units: RefCell<HashMap<String, Rc<Unit>>>,
    packages: RefCell<HashMap<String, Package>>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for sharing with loaders.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn unit_count(&self) -> usize {
        self.units.borrow().len()
    }

    pub fn package_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.packages.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl HostRegistry for LocalRegistry {
    fn define_unit(&self, name: &str, bytes: &[u8]) -> Result<Rc<Unit>, DefineError> {
        if self.units.borrow().contains_key(name) {
            return Err(DefineError::Duplicate {
                name: name.to_string(),
            });
        }
        let unit = Rc::new(Unit::decode(name, bytes)?);
        self.units
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&unit));
        debug!(unit = name, bytes = bytes.len(), "defined unit");
        Ok(unit)
    }

    fn find_unit(&self, name: &str) -> Option<Rc<Unit>> {
        self.units.borrow().get(name).cloned()
    }

    fn register_package(&self, package: Package) -> Result<(), PackageError> {
        let mut packages = self.packages.borrow_mut();
        if packages.contains_key(&package.name) {
            return Err(PackageError::AlreadyRegistered { name: package.name });
        }
        packages.insert(package.name.clone(), package);
        Ok(())
    }

    fn find_package(&self, name: &str) -> Option<Package> {
        self.packages.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{OpCode, UnitBuilder};

    fn bytes(name: &str) -> Vec<u8> {
        let mut b = UnitBuilder::new(name);
        b.emit(OpCode::Nil).emit(OpCode::Return);
        b.encode()
    }

    #[test]
    fn test_define_once() {
        let registry = LocalRegistry::new();
        let unit = registry.define_unit("a.B", &bytes("a.B")).unwrap();
        assert!(Rc::ptr_eq(&unit, &registry.find_unit("a.B").unwrap()));
        assert_eq!(
            registry.define_unit("a.B", &bytes("a.B")).unwrap_err(),
            DefineError::Duplicate { name: "a.B".into() }
        );
        assert_eq!(registry.unit_count(), 1);
    }

    #[test]
    fn test_rejected_bytes_define_nothing() {
        let registry = LocalRegistry::new();
        assert!(registry.define_unit("a.B", &bytes("a.C")).is_err());
        assert!(registry.define_unit("a.B", b"junk").is_err());
        assert!(registry.find_unit("a.B").is_none());
        assert!(registry.define_unit("a.B", &bytes("a.B")).is_ok());
    }

    #[test]
    fn test_register_package_once() {
        let registry = LocalRegistry::new();
        registry.register_package(Package::unsealed("p.q")).unwrap();
        assert_eq!(
            registry.register_package(Package::unsealed("p.q")),
            Err(PackageError::AlreadyRegistered { name: "p.q".into() })
        );
        let package = registry.find_package("p.q").unwrap();
        assert_eq!(package, Package::unsealed("p.q"));
        assert_eq!(package.seal_base, "");
        assert_eq!(registry.package_names(), vec!["p.q".to_string()]);
    }
}
