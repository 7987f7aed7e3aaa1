//! Error taxonomy for parsing rep documents.

use std::fmt;

/// Category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unbalanced delimiters, declarations in the wrong scope, nested classes,
    /// unknown tokens, unbalanced preprocessor conditionals.
    Structural,
    /// Wrong number of type/name tokens in a property, POD attribute or parameter.
    Arity,
    /// A declaration with no content where content is required, or a missing name.
    EmptyDeclaration,
    /// Malformed or out-of-range numeric literal in an enum.
    Literal,
    /// Two declarations sharing a name in the same scope.
    Duplicate,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Arity => "arity",
            ErrorKind::EmptyDeclaration => "empty-declaration",
            ErrorKind::Literal => "literal",
            ErrorKind::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First ungrammatical construct found in a document. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, (line, column): (usize, usize), message: impl Into<String>) -> Self {
        ParseError {
            kind,
            line,
            column,
            message: message.into(),
        }
    }
}

/// Failure of [`crate::parse_reader`]: either reading the input or parsing it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse: {0}")]
    Parse(#[from] ParseError),
}
