//! Mutable markup trees for mailtmpl.
//!
//! This crate wraps [`quick-xml`] to provide an arena-backed, freely mutable
//! node tree for the strict, self-closing-aware markup dialect used by email
//! templates. The composition engine re-parents, splices and removes subtrees
//! aggressively, so nodes are addressed by [`NodeId`] into an arena rather
//! than by reference; two structurally identical elements always have
//! distinct ids.
//!
//! The main types are:
//! - [`Tree`]: The document tree, rooted at a synthetic document node
//! - [`NodeId`]: Identity of a node within its tree
//! - [`NodeData`]: Node payload (doctype, element, text, comment)
//!
//! Parsing is strict and namespace-agnostic: tag and attribute names are kept
//! verbatim (`ui:section` stays `ui:section`), character entities in text and
//! attribute values are carried through undecoded, and comments and doctype
//! declarations are retained as nodes so the serializer can reproduce them.
//! Unlike a conforming XML document, a parsed tree may hold several top-level
//! nodes under the document root; included fragment files are bare node
//! sequences.
//!
//! # Example
//!
//! ```rust
//! use mailtmpl_markup::parse;
//!
//! let tree = parse(r#"<html><body><p class="lead">Hi</p></body></html>"#).unwrap();
//! let p = tree.first_element_named("p").unwrap();
//! assert_eq!(tree.attribute(p, "class"), Some("lead"));
//! assert_eq!(tree.text_content(p), "Hi");
//! ```
//!
//! Serialization is a single minifying pass, see [`minify`].

pub mod error;
pub mod minify;
pub mod parser;
pub mod tree;

pub use error::{ParseError, Result};
pub use minify::{minify, minify_children};
pub use parser::parse;
pub use tree::{Attribute, NodeData, NodeId, Tree};
