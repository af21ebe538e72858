//! Error types for stylesheet parsing and selector matching.

use thiserror::Error;

/// Result type alias for mailtmpl-css operations.
pub type Result<T> = std::result::Result<T, CssError>;

/// Errors that can occur while parsing stylesheets or selectors.
#[derive(Debug, Error)]
pub enum CssError {
    /// A rule block was opened but never closed.
    #[error("unclosed declaration block for selector '{selector}'")]
    UnclosedBlock { selector: String },

    /// An at-rule block was opened but never closed.
    #[error("unclosed at-rule block '{name}'")]
    UnclosedAtRule { name: String },

    /// A selector could not be parsed.
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}
