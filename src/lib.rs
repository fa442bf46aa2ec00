// belay - On-demand unit loading and symbol resolution
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # belay
//!
//! Two ways of resolving a name on demand:
//!
//! - [`DelegatingLoader`] loads units whose bytes come from a [`Producer`],
//!   defining each unit and its containing package exactly once and
//!   delegating every other name to a parent loader.
//! - [`Bridge`] evaluates text into functions, reads text as data, and
//!   resolves `ns/name` to a function, loading `ns` when it is not yet
//!   visible.
//!
//! ```rust
//! use belay::{Bridge, BridgeConfig, DelegatingLoader, EmptyLoader, LocalRegistry};
//!
//! let bridge = Bridge::with_config(BridgeConfig::default().embed(
//!     "bench.gen",
//!     "(ns bench.gen) (defn unit-bytes [name] nil)",
//! ));
//! let producer = bridge.producer("bench.gen", "unit-bytes").unwrap();
//!
//! let registry = LocalRegistry::shared();
//! let loader = DelegatingLoader::new(producer, EmptyLoader, registry.clone());
//! assert!(loader.load_unit("bench.Missing", false).is_err());
//! assert_eq!(registry.unit_count(), 0);
//! ```

pub use belay_bridge::{Bridge, BridgeConfig, BridgeError, FnProducer, init_tracing};
pub use belay_core::{Env, Namespace, NamespaceRegistry, Var};
pub use belay_loader::{
    BootLoader, DefineError, DelegatingLoader, EmptyLoader, HostRegistry, LinkError, LoadError,
    LoaderConfig, LocalRegistry, Lookup, MapProducer, OpCode, Package, PackageError,
    ParentLoader, Produced, Producer, ProducerError, ProducerFailurePolicy, Unit, UnitBuilder,
    package_of,
};
pub use belay_reader::{Keyword, ParseError, Symbol, Value};
