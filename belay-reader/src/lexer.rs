// belay-reader - Lexer
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexer (tokeniser) for source text and data notation.
//!
//! Converts a source string into a stream of tokens.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use num_bigint::BigInt;
use thiserror::Error;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Reader macros
    Quote,   // '
    Set,     // #{
    Discard, // #_

    // Literals
    Nil,
    True,
    False,
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Char(char),
    String(String),
    Symbol(String),
    Keyword(String),

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Quote => write!(f, "'"),
            Token::Set => write!(f, "#{{"),
            Token::Discard => write!(f, "#_"),
            Token::Nil => write!(f, "nil"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Int(n) => write!(f, "{}", n),
            Token::BigInt(n) => write!(f, "{}N", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::Char(c) => write!(f, "\\{}", c),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Symbol(s) => write!(f, "{}", s),
            Token::Keyword(s) => write!(f, ":{}", s),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexer error at {line}:{column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '\'' => self.single(Token::Quote),
            '#' => self.read_dispatch(),
            '"' => self.read_string(),
            '\\' => self.read_char(),
            ':' => self.read_keyword(),
            '-' | '+' => self.read_number_or_symbol(),
            '0'..='9' => self.read_number(),
            _ if is_symbol_start(c) => self.read_symbol(),
            _ => Err(self.error(format!("Unexpected character: '{}'", c))),
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Get the current line number (1-indexed).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the current column number (1-indexed).
    pub fn column(&self) -> usize {
        self.column
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn single(&mut self, token: Token) -> Result<Token, LexerError> {
        self.advance();
        Ok(token)
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn take_while(&mut self, buf: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            buf.push(c);
            self.advance();
        }
    }

    fn read_dispatch(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume #

        match self.peek() {
            Some('{') => self.single(Token::Set),
            Some('_') => self.single(Token::Discard),
            Some('#') => {
                // ##Inf, ##-Inf, ##NaN
                self.advance();
                let mut name = String::new();
                self.take_while(&mut name, is_symbol_char);
                match name.as_str() {
                    "Inf" => Ok(Token::Float(f64::INFINITY)),
                    "-Inf" => Ok(Token::Float(f64::NEG_INFINITY)),
                    "NaN" => Ok(Token::Float(f64::NAN)),
                    _ => Err(self.error(format!("Unknown special value: ##{}", name))),
                }
            }
            Some(c) => Err(self.error(format!("Unknown dispatch macro: #{}", c))),
            None => Err(self.error("Unexpected end of input after #".to_string())),
        }
    }

    fn read_string(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume opening "
        let mut s = String::new();

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('u') => {
                        let code = self.read_unicode_escape()?;
                        s.push(code);
                    }
                    Some(c) => return Err(self.error(format!("Unknown escape sequence: \\{}", c))),
                    None => return Err(self.error("Unterminated string escape".to_string())),
                },
                Some(c) => s.push(c),
                None => return Err(self.error("Unterminated string".to_string())),
            }
        }

        Ok(Token::String(s))
    }

    fn read_unicode_escape(&mut self) -> Result<char, LexerError> {
        let mut hex = String::with_capacity(4);
        for _ in 0..4 {
            match self.advance() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                Some(c) => {
                    return Err(self.error(format!("Invalid hex digit in unicode escape: {}", c)));
                }
                None => return Err(self.error("Unterminated unicode escape".to_string())),
            }
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| self.error("Invalid unicode escape".to_string()))?;
        char::from_u32(code)
            .ok_or_else(|| self.error(format!("Invalid unicode code point: {}", code)))
    }

    fn read_char(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume backslash

        let first = self
            .advance()
            .ok_or_else(|| self.error("Expected character after \\".to_string()))?;

        if !first.is_ascii_alphabetic() {
            return Ok(Token::Char(first));
        }

        let mut name = first.to_string();
        self.take_while(&mut name, |c| c.is_ascii_alphanumeric());

        match name.as_str() {
            "newline" => Ok(Token::Char('\n')),
            "space" => Ok(Token::Char(' ')),
            "tab" => Ok(Token::Char('\t')),
            "return" => Ok(Token::Char('\r')),
            _ if name.len() == 1 => Ok(Token::Char(first)),
            _ => Err(self.error(format!("Unknown character name: \\{}", name))),
        }
    }

    fn read_keyword(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume :

        let mut name = String::new();
        self.take_while(&mut name, |c| is_symbol_char(c) || c == '/');

        if name.is_empty() {
            return Err(self.error("Expected keyword name after :".to_string()));
        }
        Ok(Token::Keyword(name))
    }

    fn read_symbol(&mut self) -> Result<Token, LexerError> {
        let mut name = String::new();
        self.take_while(&mut name, |c| is_symbol_char(c) || c == '/');

        match name.as_str() {
            "nil" => Ok(Token::Nil),
            "true" => Ok(Token::True),
            "false" => Ok(Token::False),
            _ => Ok(Token::Symbol(name)),
        }
    }

    fn read_number_or_symbol(&mut self) -> Result<Token, LexerError> {
        let mut s = String::new();
        if let Some(sign) = self.advance() {
            s.push(sign);
        }

        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                self.take_while(&mut s, is_number_char);
                self.parse_number(&s)
            }
            _ => {
                // A symbol like +, -, or ->
                self.take_while(&mut s, |c| is_symbol_char(c) || c == '/');
                Ok(Token::Symbol(s))
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let mut s = String::new();
        self.take_while(&mut s, is_number_char);
        self.parse_number(&s)
    }

    fn parse_number(&self, s: &str) -> Result<Token, LexerError> {
        use num_traits::Num;

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        if let Some(hex) = unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
        {
            let big = BigInt::from_str_radix(hex, 16)
                .map_err(|_| self.error(format!("Invalid hex integer: {}", s)))?;
            return Ok(narrow(if negative { -big } else { big }));
        }

        if let Some(digits) = unsigned.strip_suffix('N') {
            let big: BigInt = digits
                .parse()
                .map_err(|_| self.error(format!("Invalid BigInt: {}", s)))?;
            return Ok(Token::BigInt(if negative { -big } else { big }));
        }

        if unsigned.contains(['.', 'e', 'E']) {
            let n: f64 = s
                .parse()
                .map_err(|_| self.error(format!("Invalid float: {}", s)))?;
            return Ok(Token::Float(n));
        }

        // Parse the signed text first so i64::MIN stays an Int.
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Token::Int(n));
        }
        let big: BigInt = unsigned
            .parse()
            .map_err(|_| self.error(format!("Invalid integer: {}", s)))?;
        Ok(Token::BigInt(if negative { -big } else { big }))
    }
}

/// Fit a parsed integer into an `Int` token when possible.
fn narrow(n: BigInt) -> Token {
    match i64::try_from(&n) {
        Ok(small) => Token::Int(small),
        Err(_) => Token::BigInt(n),
    }
}

/// Check if a character can start a symbol.
fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic()
        || matches!(
            c,
            '*' | '!' | '_' | '?' | '<' | '>' | '=' | '&' | '%' | '.' | '$'
        )
}

/// Check if a character can appear inside a symbol.
fn is_symbol_char(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit() || matches!(c, '-' | '+' | '\'' | '#' | ':')
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(s: &str) -> Result<Vec<Token>, LexerError> {
        Lexer::new(s).tokenize()
    }

    #[test]
    fn test_delimiters() {
        let tokens = tokenize("()[]{}#{").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
                Token::Set,
            ]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Int(42)]);
        assert_eq!(tokenize("-17").unwrap(), vec![Token::Int(-17)]);
        assert_eq!(tokenize("+3").unwrap(), vec![Token::Int(3)]);
        assert_eq!(tokenize("0xff").unwrap(), vec![Token::Int(255)]);
        assert_eq!(
            tokenize("-9223372036854775808").unwrap(),
            vec![Token::Int(i64::MIN)]
        );
    }

    #[test]
    fn test_bigint_promotion() {
        let tokens = tokenize("9223372036854775808").unwrap();
        assert_eq!(
            tokens,
            vec![Token::BigInt("9223372036854775808".parse().unwrap())]
        );
        assert_eq!(tokenize("7N").unwrap(), vec![Token::BigInt(BigInt::from(7))]);
    }

    #[test]
    fn test_floats() {
        assert_eq!(tokenize("3.5").unwrap(), vec![Token::Float(3.5)]);
        assert_eq!(tokenize("1e3").unwrap(), vec![Token::Float(1000.0)]);
        assert_eq!(tokenize("##Inf").unwrap(), vec![Token::Float(f64::INFINITY)]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""a\"b\nA""#).unwrap(),
            vec![Token::String("a\"b\nA".to_string())]
        );
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn test_chars() {
        assert_eq!(
            tokenize(r"\a \newline \space").unwrap(),
            vec![Token::Char('a'), Token::Char('\n'), Token::Char(' ')]
        );
    }

    #[test]
    fn test_symbols_and_keywords() {
        assert_eq!(
            tokenize("bench.core/run :mode :jmh/fork + ->").unwrap(),
            vec![
                Token::Symbol("bench.core/run".to_string()),
                Token::Keyword("mode".to_string()),
                Token::Keyword("jmh/fork".to_string()),
                Token::Symbol("+".to_string()),
                Token::Symbol("->".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_commas() {
        assert_eq!(
            tokenize("1, 2 ; trailing\n3").unwrap(),
            vec![Token::Int(1), Token::Int(2), Token::Int(3)]
        );
    }

    #[test]
    fn test_error_position() {
        let err = tokenize("(foo\n  #x)").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("#x"));
    }
}
