// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for defining, linking and loading units.

use thiserror::Error;

/// Failure to load a unit by name.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither the producer nor any parent knows the name.
    #[error("Unit not found: {name}")]
    UnitNotFound { name: String },

    /// The producer failed and the loader is configured to propagate.
    #[error("Unit not found: {name} (producer failed)")]
    ProducerFailed {
        name: String,
        #[source]
        source: ProducerError,
    },

    /// The host registry rejected the produced bytes.
    #[error(transparent)]
    Define(#[from] DefineError),

    /// The unit was defined but failed verification.
    #[error("Failed to link unit {name}")]
    Link {
        name: String,
        #[source]
        source: LinkError,
    },
}

impl LoadError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LoadError::UnitNotFound { name: name.into() }
    }

    /// True for failures that mean "no such unit".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::UnitNotFound { .. } | LoadError::ProducerFailed { .. }
        )
    }
}

/// Rejection from [`HostRegistry::define_unit`](crate::HostRegistry::define_unit).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefineError {
    #[error("Attempted duplicate definition of unit {name}")]
    Duplicate { name: String },

    #[error("Unit bytes name {found}, expected {expected}")]
    WrongName { expected: String, found: String },

    #[error("Malformed unit {name}: {reason}")]
    Malformed { name: String, reason: String },
}

/// Rejection from [`HostRegistry::register_package`](crate::HostRegistry::register_package).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageError {
    #[error("Package {name} is already registered")]
    AlreadyRegistered { name: String },
}

/// Verification failure while linking a unit.
///
/// `at` is the index of the offending instruction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("Unit has no instructions")]
    Empty,

    #[error("Constant index {index} out of range at instruction {at}")]
    ConstantOutOfRange { at: usize, index: u16 },

    #[error("Constant {index} referenced at instruction {at} is not a symbol")]
    NotASymbol { at: usize, index: u16 },

    #[error("Local slot {slot} out of range at instruction {at}")]
    LocalOutOfRange { at: usize, slot: u16 },

    #[error("Jump at instruction {at} targets {target}, outside the unit")]
    JumpOutOfRange { at: usize, target: isize },

    #[error("Control falls off the end of the unit after instruction {at}")]
    FallsOffEnd { at: usize },

    #[error("Stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    #[error("Inconsistent stack depth at instruction {at}: {expected} vs {found}")]
    StackMismatch {
        at: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure raised by a [`Producer`](crate::Producer).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProducerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + 'static>>,
}

impl ProducerError {
    pub fn new(message: impl Into<String>) -> Self {
        ProducerError {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it as the source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + 'static,
    ) -> Self {
        ProducerError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
