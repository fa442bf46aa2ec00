// belay-reader - Reader for source text and data notation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # belay-reader
//!
//! Lexer, parser and value model. Produces `Value` forms from source
//! strings, either as code for the evaluator or as inert data.

pub mod keyword;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod value;

pub use im::{OrdMap, OrdSet, Vector};
pub use keyword::Keyword;
pub use lexer::{Lexer, LexerError};
pub use num_bigint::BigInt;
pub use parser::{ParseError, Parser, ReadMode};
pub use symbol::Symbol;
pub use value::{FnArity, Function, NativeFn, Value};
