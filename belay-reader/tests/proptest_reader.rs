// belay-reader - Property-based tests for the reader
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for the reader.
//!
//! - Every i64 literal reads back as the same `Int`
//! - Printed data reads back as equal data
//! - Data mode never produces a different value than code mode for plain data

use belay_reader::{Keyword, Parser, Value};
use proptest::prelude::*;

fn arb_keyword() -> impl Strategy<Value = Value> {
    "[a-z][a-z0-9-]{0,8}".prop_map(|name| Value::keyword(Keyword::new(&name)))
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::bool),
        any::<i64>().prop_map(Value::int),
        "[ -~]{0,12}".prop_map(Value::string),
        arb_keyword(),
    ]
}

fn arb_data() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::vector),
            prop::collection::vec((arb_keyword(), inner), 0..4).prop_map(Value::map),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn int_literals_read_back(n in any::<i64>()) {
        let read = Parser::parse_str(&n.to_string()).unwrap();
        prop_assert_eq!(read, Some(Value::int(n)));
    }

    #[test]
    fn printed_data_reads_back(value in arb_data()) {
        let text = value.to_string();
        let read = Parser::data(&text).unwrap().parse().unwrap();
        prop_assert_eq!(read, Some(value));
    }

    #[test]
    fn data_mode_agrees_with_code_mode(value in arb_data()) {
        let text = value.to_string();
        let as_code = Parser::parse_str(&text).unwrap();
        let as_data = Parser::data(&text).unwrap().parse().unwrap();
        prop_assert_eq!(as_code, as_data);
    }
}
