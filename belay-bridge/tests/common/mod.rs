// belay-bridge - Shared test helpers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

#![allow(dead_code)]

pub use belay_bridge::{Bridge, BridgeConfig, BridgeError};
pub use belay_core::{Keyword, Symbol, Value};

pub fn kw(name: &str) -> Value {
    Value::keyword(Keyword::parse(name))
}

pub fn sym(name: &str) -> Value {
    Value::symbol(Symbol::parse(name))
}

/// A bridge with the given embedded namespaces and no load paths.
pub fn bridge_with(sources: &[(&str, &str)]) -> Bridge {
    let config = sources
        .iter()
        .fold(BridgeConfig::default().load_paths(Vec::<String>::new()), |config, (ns, text)| {
            config.embed(*ns, *text)
        });
    Bridge::with_config(config)
}

/// Source for namespace `ns` defining `unit-bytes`, which returns the
/// listed bytes for each known unit name and nil for anything else.
pub fn producer_source(ns: &str, bytes_by_name: &[(&str, Vec<u8>)]) -> String {
    let clauses: Vec<String> = bytes_by_name
        .iter()
        .map(|(name, bytes)| {
            let bytes: Vec<String> = bytes.iter().map(u8::to_string).collect();
            format!("(if (= n \"{}\") [{}]", name, bytes.join(" "))
        })
        .collect();
    let closing = ")".repeat(clauses.len());
    format!(
        "(ns {}) (defn unit-bytes [n] {} nil{})",
        ns,
        clauses.join(" "),
        closing
    )
}
