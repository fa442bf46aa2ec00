// belay-bridge - Bridge errors
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use belay_reader::ParseError;
use thiserror::Error;

/// Failure of a bridge operation.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Read error: {0}")]
    Read(#[source] ParseError),

    #[error("Evaluation failed: {0}")]
    Eval(#[source] belay_core::Error),

    #[error("Form did not evaluate to a function: {text}")]
    TextDidNotEvaluateToFunction { text: String },

    #[error("{ns}/{name} did not resolve as a function")]
    SymbolNotInvocable {
        ns: String,
        name: String,
        #[source]
        source: Option<belay_core::Error>,
    },
}

impl BridgeError {
    pub(crate) fn not_invocable(
        ns: &str,
        name: &str,
        source: Option<belay_core::Error>,
    ) -> Self {
        BridgeError::SymbolNotInvocable {
            ns: ns.to_string(),
            name: name.to_string(),
            source,
        }
    }
}

impl From<ParseError> for BridgeError {
    fn from(e: ParseError) -> Self {
        BridgeError::Read(e)
    }
}

// Reader failures raised inside the evaluator stay reader failures.
impl From<belay_core::Error> for BridgeError {
    fn from(e: belay_core::Error) -> Self {
        match e {
            belay_core::Error::Read(e) => BridgeError::Read(e),
            other => BridgeError::Eval(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
