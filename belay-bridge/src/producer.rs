// belay-bridge - Functions as unit producers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Adapts a resolved function into a loader [`Producer`].
//!
//! The function is called with the unit name as a string. It returns nil to
//! decline, or a vector (or list) of integers in `0..=255` holding the unit
//! bytes.

use belay_core::{Value, apply};
use belay_loader::{Produced, Producer, ProducerError};

/// A [`Producer`] backed by a function value.
#[derive(Debug, Clone)]
pub struct FnProducer {
    func: Value,
}

impl FnProducer {
    /// Wrap `func`. Returns `None` if it is not invocable.
    pub fn new(func: Value) -> Option<Self> {
        func.is_fn().then_some(FnProducer { func })
    }

    pub fn func(&self) -> &Value {
        &self.func
    }
}

impl Producer for FnProducer {
    fn produce(&self, name: &str) -> Produced {
        let result = apply(&self.func, &[Value::string(name)])
            .map_err(|e| ProducerError::with_source(format!("producer failed for {}", name), e))?;
        match result {
            Value::Nil => Ok(None),
            Value::Vector(items) | Value::List(items) => items
                .iter()
                .map(to_byte)
                .collect::<Result<Vec<u8>, _>>()
                .map(Some),
            other => Err(ProducerError::new(format!(
                "producer returned {} for {}, expected nil or a byte vector",
                other.type_name(),
                name
            ))),
        }
    }
}

fn to_byte(value: &Value) -> Result<u8, ProducerError> {
    match value {
        Value::Int(n) => u8::try_from(*n)
            .map_err(|_| ProducerError::new(format!("byte value {} out of range", n))),
        other => Err(ProducerError::new(format!(
            "expected byte, got {}",
            other.type_name()
        ))),
    }
}
