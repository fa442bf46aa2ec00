// belay-loader - Property-based tests for package derivation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for containing-package handling.
//!
//! - Package names are the prefix before the last separator
//! - Names without a separator never register a package
//! - Sibling units register their package exactly once

mod common;

use common::*;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn package_is_prefix_before_last_dot(
        parts in prop::collection::vec(segment(), 1..5),
        leaf in "[A-Z][A-Za-z0-9]{0,6}",
    ) {
        let package = parts.join(".");
        let name = format!("{}.{}", package, leaf);
        prop_assert_eq!(package_of(&name), Some(package.as_str()));
    }

    #[test]
    fn names_without_separator_register_no_package(name in "[A-Za-z_][A-Za-z0-9_$]{0,12}") {
        let registry = RecordingRegistry::shared();
        let loader = DelegatingLoader::new(
            MapProducer::new().with(name.clone(), unit_bytes(&name, 0)),
            EmptyLoader,
            registry.clone(),
        );
        prop_assert!(loader.load_unit(&name, true).is_ok());
        prop_assert!(registry.package_attempts.borrow().is_empty());
        prop_assert!(registry.packages().is_empty());
    }

    #[test]
    fn siblings_share_one_package(
        package in segment(),
        leaves in prop::collection::btree_set("[A-Z][a-z]{0,4}", 1..6),
    ) {
        let registry = RecordingRegistry::shared();
        let mut producer = MapProducer::new();
        for leaf in &leaves {
            let name = format!("{}.{}", package, leaf);
            producer.insert(name.clone(), unit_bytes(&name, 0));
        }
        let loader = DelegatingLoader::new(producer, EmptyLoader, registry.clone());

        for leaf in &leaves {
            let name = format!("{}.{}", package, leaf);
            prop_assert!(loader.load_unit(&name, false).is_ok());
        }
        prop_assert_eq!(registry.packages(), vec![package.clone()]);
        prop_assert_eq!(registry.attempts_for(&package), 1);
    }
}
