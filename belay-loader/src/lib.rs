// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Units, the host registry, and the delegating loader.
//!
//! Unit bytes come from a [`Producer`]. A [`DelegatingLoader`] defines
//! produced units in a [`HostRegistry`] exactly once, registers their
//! containing package, and hands every declined name to its parent.

pub mod error;
pub mod loader;
pub mod opcode;
pub mod registry;
pub mod unit;

pub use error::{DefineError, LinkError, LoadError, PackageError, ProducerError};
pub use loader::{
    BootLoader, DelegatingLoader, EmptyLoader, LoaderConfig, Lookup, MapProducer, ParentLoader,
    Produced, Producer, ProducerFailurePolicy,
};
pub use opcode::OpCode;
pub use registry::{HostRegistry, LocalRegistry, Package};
pub use unit::{FORMAT_VERSION, MAGIC, Unit, UnitBuilder, package_of};
