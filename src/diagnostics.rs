use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which pass produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "SCANNER")]
    Lex,
    #[serde(rename = "PARSER")]
    Parse,
    #[serde(rename = "SEMANTIC")]
    Semantic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Lex => "SCANNER",
            Category::Parse => "PARSER",
            Category::Semantic => "SEMANTIC",
        };
        f.write_str(name)
    }
}

/// A non-fatal error report. Diagnostics are accumulated during the pass
/// and surfaced together after it completes; they never abort processing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("ERROR({category}): {message} at line {line}, column {column}")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(rename = "type")]
    pub category: Category,
}

impl Diagnostic {
    pub fn lex(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(Category::Lex, message, line, column)
    }

    pub fn parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(Category::Parse, message, line, column)
    }

    pub fn semantic(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(Category::Semantic, message, line, column)
    }

    fn new(category: Category, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            category,
        }
    }
}
