//! Per-compile result context.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How a referenced file contributes to the compiled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DependencyKind {
    /// Base template named by the `ui:template` attribute.
    Template,
    /// Stylesheet pulled in as a `<style>` block, left for the client.
    Style,
    /// Stylesheet pulled in for inlining into `style` attributes.
    StyleInline,
    /// Markup fragment spliced in via `<link rel="import">`.
    Fragment,
}

/// A file the compiled document depends on.
///
/// Serializable so callers can persist dependency records for rebuild
/// tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub path: PathBuf,
    pub kind: DependencyKind,
}

/// Everything a single compile produced.
///
/// One context is created per [`Processor::process`](crate::Processor::process)
/// call and never shared between compiles.
#[derive(Debug, Default)]
pub struct ProcessorContext {
    dependencies: HashSet<Dependency>,
    meta: IndexMap<String, String>,
    html: String,
    title: String,
}

impl ProcessorContext {
    /// Every file referenced while compiling, deduplicated.
    pub fn dependencies(&self) -> &HashSet<Dependency> {
        &self.dependencies
    }

    /// `<meta name=... content=...>` pairs found in the output document, in
    /// document order.
    pub fn meta(&self) -> &IndexMap<String, String> {
        &self.meta
    }

    /// The minified output markup.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The output document's `<title>` text, empty if there is none.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn add_dependency(&mut self, path: &Path, kind: DependencyKind) {
        self.dependencies.insert(Dependency {
            path: path.to_path_buf(),
            kind,
        });
    }

    pub(crate) fn add_meta(&mut self, name: &str, content: &str) {
        self.meta.insert(name.to_string(), content.to_string());
    }

    pub(crate) fn set_html(&mut self, html: String) {
        self.html = html;
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }
}
