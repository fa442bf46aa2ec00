// belay-loader - Shared test helpers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub use belay_loader::*;
pub use belay_reader::Value;

/// Bytes for a unit whose body returns `value`.
pub fn unit_bytes(name: &str, value: i64) -> Vec<u8> {
    let mut b = UnitBuilder::new(name);
    let k = b.add_constant(Value::int(value)).unwrap();
    b.emit(OpCode::Const(k)).emit(OpCode::Return);
    b.encode()
}

/// A registry that records every package registration attempt.
#[derive(Default)]
pub struct RecordingRegistry {
    inner: LocalRegistry,
    pub package_attempts: RefCell<Vec<String>>,
    pub define_calls: Cell<usize>,
}

impl RecordingRegistry {
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn attempts_for(&self, package: &str) -> usize {
        self.package_attempts
            .borrow()
            .iter()
            .filter(|p| p.as_str() == package)
            .count()
    }

    pub fn packages(&self) -> Vec<String> {
        self.inner.package_names()
    }
}

impl HostRegistry for RecordingRegistry {
    fn define_unit(&self, name: &str, bytes: &[u8]) -> Result<Rc<Unit>, DefineError> {
        self.define_calls.set(self.define_calls.get() + 1);
        self.inner.define_unit(name, bytes)
    }

    fn find_unit(&self, name: &str) -> Option<Rc<Unit>> {
        self.inner.find_unit(name)
    }

    fn register_package(&self, package: Package) -> Result<(), PackageError> {
        self.package_attempts.borrow_mut().push(package.name.clone());
        self.inner.register_package(package)
    }

    fn find_package(&self, name: &str) -> Option<Package> {
        self.inner.find_package(name)
    }
}

/// A producer that serves `prefix.*` names and declines everything else.
pub fn prefix_producer(prefix: &'static str) -> impl Fn(&str) -> Produced {
    move |name: &str| -> Produced {
        Ok(name
            .strip_prefix(prefix)
            .filter(|rest| rest.starts_with('.') || rest.is_empty())
            .map(|_| unit_bytes(name, 1)))
    }
}
