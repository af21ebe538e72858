//! Error types for template compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mailtmpl operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Errors that can occur while compiling a template.
///
/// Most failures are tolerated per tag and logged rather than surfaced; this
/// type covers the remainder: the root document itself being unreadable or
/// unparseable, and internal failures that the per-tag handlers log.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("markup error: {0}")]
    Markup(#[from] mailtmpl_markup::ParseError),

    #[error("stylesheet error: {0}")]
    Css(#[from] mailtmpl_css::CssError),

    /// An include chain nested deeper than the configured limit.
    #[error("include depth limit of {max_depth} exceeded at '{path}'")]
    IncludeDepthExceeded { path: PathBuf, max_depth: usize },
}
