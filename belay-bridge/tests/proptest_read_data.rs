// belay-bridge - Property-based tests for data reading
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for `read_data`.
//!
//! - Printed integers and keyword maps read back unchanged
//! - Arbitrary list text is returned as data, never evaluated

mod common;

use common::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn integers_read_back(n in any::<i64>()) {
        let bridge = Bridge::new();
        prop_assert_eq!(bridge.read_data(&n.to_string()).unwrap(), Value::int(n));
    }

    #[test]
    fn keyword_maps_read_back(entries in prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..5)) {
        let text = format!(
            "{{{}}}",
            entries
                .iter()
                .map(|(k, v)| format!(":{} {}", k, v))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let expected = Value::map(
            entries
                .iter()
                .map(|(k, v)| (kw(k), Value::int(i64::from(*v)))),
        );
        prop_assert_eq!(Bridge::new().read_data(&text).unwrap(), expected);
    }

    #[test]
    fn calls_are_not_evaluated(name in "[a-z][a-z-]{0,8}", arg in any::<i32>()) {
        prop_assume!(!matches!(name.as_str(), "nil" | "true" | "false"));
        let bridge = Bridge::new();
        let text = format!("({} {})", name, arg);
        let value = bridge.read_data(&text).unwrap();
        prop_assert_eq!(value, Value::list([sym(&name), Value::int(i64::from(arg))]));
    }
}
