//! Flat CSS rule parsing and selector matching for mailtmpl.
//!
//! Email templates are styled by fixed, author-controlled stylesheets, so
//! this crate deliberately models only the subset the inliner needs:
//!
//! - [`parse_stylesheet`] turns a stylesheet body into an ordered list of
//!   selector/declaration-list [`Rule`]s. At-rules (`@media`, `@font-face`,
//!   ...) are skipped whole; comments are stripped; no cascade or
//!   specificity is computed — source order is the only precedence.
//! - [`Selector`] matches elements of a [`mailtmpl_markup::Tree`] against
//!   type, `.class`, `#id` and `[attr]`/`[attr=value]` parts, compounds of
//!   those, descendant and child combinators, and comma groups.
//!
//! Pseudo-classes and pseudo-elements are out of scope; the inlining engine
//! skips any rule whose selector text contains `:` before it gets here.

pub mod error;
pub mod parser;
pub mod selector;

pub use error::{CssError, Result};
pub use parser::{Declaration, Rule, Stylesheet, parse_stylesheet};
pub use selector::Selector;
