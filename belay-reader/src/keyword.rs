// belay-reader - Keyword type
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Keywords are self-evaluating identifiers that may be optionally namespaced.

use std::fmt;

use crate::symbol::Symbol;

/// A keyword with optional namespace.
///
/// Keywords are self-evaluating and always print with a leading colon.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Keyword {
    sym: Symbol,
}

impl Keyword {
    /// Create a new keyword with no namespace.
    pub fn new(name: &str) -> Self {
        Keyword {
            sym: Symbol::new(name),
        }
    }

    /// Create a new keyword with a namespace.
    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        Keyword {
            sym: Symbol::with_namespace(namespace, name),
        }
    }

    /// Parse a keyword from a string like ":foo" or ":ns/foo".
    /// The leading colon is optional.
    pub fn parse(s: &str) -> Self {
        let s = s.strip_prefix(':').unwrap_or(s);
        Keyword {
            sym: Symbol::parse(s),
        }
    }

    /// Get the namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.sym.namespace()
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.sym.name()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.sym)
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_keyword() {
        let kw = Keyword::new("mode");
        assert_eq!(kw.name(), "mode");
        assert!(kw.namespace().is_none());
        assert_eq!(kw.to_string(), ":mode");
    }

    #[test]
    fn test_parse_with_colon() {
        let kw = Keyword::parse(":jmh/fork");
        assert_eq!(kw.namespace(), Some("jmh"));
        assert_eq!(kw.name(), "fork");
        assert_eq!(kw, Keyword::with_namespace("jmh", "fork"));
    }

    #[test]
    fn test_parse_without_colon() {
        assert_eq!(Keyword::parse("a"), Keyword::new("a"));
    }
}
