// belay-bridge - Embedding surface for belay
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # belay-bridge
//!
//! Turns text and qualified names into callable values.
//!
//! - [`Bridge::evaluate_text`] reads and evaluates a form that must yield a
//!   function.
//! - [`Bridge::read_data`] reads text as inert data.
//! - [`Bridge::resolve_function`] finds `ns/name`, loading `ns` on demand.
//!
//! A resolved function can also serve as a unit producer for
//! [`belay_loader::DelegatingLoader`] through [`FnProducer`].
//!
//! ## Quick Start
//!
//! ```rust
//! use belay_bridge::{Bridge, BridgeConfig};
//! use belay_core::Value;
//!
//! let bridge = Bridge::with_config(
//!     BridgeConfig::default().embed("bench.math", "(ns bench.math) (defn sq [x] (* x x))"),
//! );
//! let sq = bridge.resolve_function("bench.math", "sq").unwrap();
//! assert_eq!(bridge.call(&sq, &[Value::int(7)]).unwrap(), Value::int(49));
//! ```

mod bridge;
mod config;
pub mod edn;
mod error;
mod producer;

use std::sync::Once;

pub use bridge::Bridge;
pub use config::{BridgeConfig, LOAD_PATH_VAR};
pub use error::{BridgeError, Result};
pub use producer::FnProducer;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber for debug output.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=belay_loader=debug`.
/// Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
