// belay-reader - Parser
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Recursive descent parser.
//!
//! Converts tokens into `Value` forms. The same parser serves two readers:
//! [`ReadMode::Code`] for forms that will be evaluated, and
//! [`ReadMode::Data`] for configuration-like payloads that must never
//! execute. Data mode rejects reader macros that only make sense for code.

use thiserror::Error;

use crate::keyword::Keyword;
use crate::lexer::{Lexer, LexerError, Token};
use crate::symbol::Symbol;
use crate::value::Value;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

/// What the parsed forms are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Forms that will be evaluated.
    #[default]
    Code,
    /// Inert data; code-only syntax is an error.
    Data,
}

/// The parser converts tokens into `Value` forms.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    line: usize,
    column: usize,
    mode: ReadMode,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Self::with_mode(source, ReadMode::Code)
    }

    /// Create a parser for inert data.
    pub fn data(source: &'a str) -> Result<Self, ParseError> {
        Self::with_mode(source, ReadMode::Data)
    }

    /// Create a parser in the given mode.
    pub fn with_mode(source: &'a str, mode: ReadMode) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let line = lexer.line();
        let column = lexer.column();
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            line,
            column,
            mode,
        })
    }

    /// Parse a single form from the source.
    /// Returns None if at end of input.
    pub fn parse(&mut self) -> Result<Option<Value>, ParseError> {
        loop {
            match self.current {
                Token::Eof => return Ok(None),
                Token::Discard => {
                    // A discard at top level may consume the last form.
                    self.advance()?;
                    self.parse_form()?;
                }
                _ => return self.parse_form().map(Some),
            }
        }
    }

    /// Parse all forms from the source.
    pub fn parse_all(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut forms = Vec::new();
        while let Some(form) = self.parse()? {
            forms.push(form);
        }
        Ok(forms)
    }

    /// Parse a string and return the first form.
    pub fn parse_str(source: &str) -> Result<Option<Value>, ParseError> {
        Parser::new(source)?.parse()
    }

    /// Parse a string and return all forms.
    pub fn parse_all_str(source: &str) -> Result<Vec<Value>, ParseError> {
        Parser::new(source)?.parse_all()
    }

    // ========================================================================
    // Internal parsing methods
    // ========================================================================

    fn advance(&mut self) -> Result<Token, ParseError> {
        let prev = std::mem::replace(&mut self.current, Token::Eof);
        self.line = self.lexer.line();
        self.column = self.lexer.column();
        self.current = self.lexer.next_token()?;
        Ok(prev)
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn parse_form(&mut self) -> Result<Value, ParseError> {
        match self.advance()? {
            Token::Nil => Ok(Value::nil()),
            Token::True => Ok(Value::bool(true)),
            Token::False => Ok(Value::bool(false)),
            Token::Int(n) => Ok(Value::int(n)),
            Token::BigInt(n) => Ok(Value::bigint(n)),
            Token::Float(n) => Ok(Value::float(n)),
            Token::Char(c) => Ok(Value::char(c)),
            Token::String(s) => Ok(Value::string(s)),
            Token::Symbol(s) => Ok(Value::symbol(Symbol::parse(&s))),
            Token::Keyword(s) => Ok(Value::keyword(Keyword::parse(&s))),

            Token::LParen => self.parse_seq(&Token::RParen).map(Value::list),
            Token::LBracket => self.parse_seq(&Token::RBracket).map(Value::vector),
            Token::LBrace => self.parse_map(),
            Token::Set => self.parse_seq(&Token::RBrace).map(Value::set),

            Token::Quote if self.mode == ReadMode::Data => {
                Err(self.error("quote is not allowed in data".to_string()))
            }
            Token::Quote => {
                let form = self.parse_form()?;
                Ok(Value::list([Value::symbol(Symbol::new("quote")), form]))
            }
            Token::Discard => {
                self.parse_form()?;
                self.parse_form()
            }

            Token::RParen => Err(self.error("Unexpected ')'".to_string())),
            Token::RBracket => Err(self.error("Unexpected ']'".to_string())),
            Token::RBrace => Err(self.error("Unexpected '}'".to_string())),
            Token::Eof => Err(self.error("Unexpected end of input".to_string())),
        }
    }

    /// Parse forms up to (and consuming) `close`.
    fn parse_seq(&mut self, close: &Token) -> Result<Vec<Value>, ParseError> {
        let mut elements = Vec::new();
        loop {
            if &self.current == close {
                self.advance()?;
                return Ok(elements);
            }
            match self.current {
                Token::Eof => {
                    return Err(self.error(format!("Expected '{}', found end of input", close)));
                }
                Token::Discard => {
                    self.advance()?;
                    self.parse_form()?;
                }
                _ => elements.push(self.parse_form()?),
            }
        }
    }

    fn parse_map(&mut self) -> Result<Value, ParseError> {
        let forms = self.parse_seq(&Token::RBrace)?;
        if forms.len() % 2 != 0 {
            return Err(self.error("Map literal must contain an even number of forms".to_string()));
        }
        let mut pairs = Vec::with_capacity(forms.len() / 2);
        let mut iter = forms.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            pairs.push((k, v));
        }
        Ok(Value::map(pairs))
    }
}
