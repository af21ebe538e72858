//! HTML email template compiler.
//!
//! Compiles a source markup document into a single, self-contained, minified
//! HTML artifact suitable for use as an email body. A source document may:
//!
//! - inherit from a base template (`<html ui:template="base.html">`), filling
//!   the template's `<ui:include section="x"/>` markers with its own
//!   `<ui:section name="x">` blocks;
//! - splice in reusable fragments (`<link rel="import" href="frag.html">`),
//!   passing values to the fragment's `<parameter name=...>` placeholders
//!   through `<parameter>` children of the link tag, including placeholders
//!   hidden inside conditional comments;
//! - pull in stylesheets (`<link rel="stylesheet" href="main.css">`), either
//!   kept as a `<style>` block or, when the link carries the `ui:inline`
//!   marker attribute, converted into per-element `style` attributes.
//!
//! The entry point is [`Processor`]; each compile yields a
//! [`ProcessorContext`] with the minified html, the document title, extracted
//! metadata and the set of files the output depends on.
//!
//! ```no_run
//! use mailtmpl::Processor;
//! use std::path::Path;
//!
//! let context = Processor::new().process(Path::new("welcome.html"))?;
//! for dep in context.dependencies() {
//!     println!("depends on {}", dep.path.display());
//! }
//! # Ok::<(), mailtmpl::ProcessError>(())
//! ```
//!
//! The tree and serializer live in [`mailtmpl_markup`], the stylesheet rule
//! model in [`mailtmpl_css`]. This crate logs through [`tracing`] and never
//! installs a subscriber; embedding applications choose their own.

mod conditional;
mod context;
mod error;
mod inline;
mod params;
mod processor;

pub use context::{Dependency, DependencyKind, ProcessorContext};
pub use error::{ProcessError, Result};
pub use processor::{Processor, process, process_to};
