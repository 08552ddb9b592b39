//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E002`, `W001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Malformed token: bad character, unterminated string, bad number.
    pub const LEXICAL: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
    /// Token sequence does not match the query grammar.
    pub const SYNTAX: DiagnosticCode = DiagnosticCode::new(Category::Error, 2);
    /// `use` of a library that does not exist.
    pub const UNKNOWN_LIBRARY: DiagnosticCode = DiagnosticCode::new(Category::Error, 3);
    /// Reference to a name with no binding in scope.
    pub const UNKNOWN_VARIABLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 4);
    /// Call to a function that is unknown or whose library is not imported.
    pub const UNKNOWN_FUNCTION: DiagnosticCode = DiagnosticCode::new(Category::Error, 5);
    /// Call with the wrong number of arguments.
    pub const ARITY: DiagnosticCode = DiagnosticCode::new(Category::Error, 6);
    /// A range or `let` variable bound twice.
    pub const DUPLICATE_BINDING: DiagnosticCode = DiagnosticCode::new(Category::Error, 7);
    /// The input stream used anywhere but the first `from` source.
    pub const LINES_MISUSE: DiagnosticCode = DiagnosticCode::new(Category::Error, 8);
    /// A binding that is never read.
    pub const UNUSED_BINDING: DiagnosticCode = DiagnosticCode::new(Category::Warning, 1);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
    }

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::SYNTAX.to_string(), "E002");
        assert_eq!(DiagnosticCode::UNUSED_BINDING.to_string(), "W001");
        assert_eq!(DiagnosticCode::new(Category::Error, 142).to_string(), "E142");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::ARITY;
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
