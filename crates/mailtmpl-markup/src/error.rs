//! Error types for markup parsing.

use thiserror::Error;

/// Result type alias for mailtmpl-markup operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing markup into a [`crate::Tree`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Syntax error reported by quick-xml.
    #[error("markup syntax error: {message} at byte {position}")]
    Syntax { message: String, position: u64 },

    /// Malformed attribute list inside a tag.
    #[error("malformed attribute in <{tag}>: {message}")]
    Attribute { tag: String, message: String },

    /// The input ended with unclosed elements on the stack.
    #[error("unexpected end of input, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String },

    /// A closing tag appeared without a matching open element.
    #[error("unexpected closing tag </{found}>")]
    UnexpectedClosingTag { found: String },
}
