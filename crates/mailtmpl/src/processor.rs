//! The composition engine.
//!
//! Compilation runs in passes over a single mutable tree: resolve link tags
//! to a fixed point, apply the base template if the document names one,
//! resolve the links the template brought in, inline styles, inject and
//! extract metadata, then serialize. Per-tag failures are logged and the tag
//! is left behind unresolved; only root-document failures abort the compile.

use crate::conditional::rewrite_conditionals;
use crate::context::{DependencyKind, ProcessorContext};
use crate::inline::inline_styles;
use crate::params::apply_parameters;
use crate::{ProcessError, Result};
use mailtmpl_markup::{NodeData, NodeId, Tree, minify, minify_children, parse};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const LINK_TAG: &str = "link";
const LINK_REL_ATTR: &str = "rel";
const LINK_REL_STYLE: &str = "stylesheet";
const LINK_REL_IMPORT: &str = "import";
const LINK_HREF_ATTR: &str = "href";
const LINK_INLINE_ATTR: &str = "ui:inline";

const PARAMETER_TAG: &str = "parameter";
const PARAMETER_NAME_ATTR: &str = "name";

const TEMPLATE_ATTR: &str = "ui:template";
const SECTION_TAG: &str = "ui:section";
const SECTION_NAME_ATTR: &str = "name";
const INCLUDE_TAG: &str = "ui:include";
const INCLUDE_SECTION_ATTR: &str = "section";

const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// HTML email template compiler.
///
/// Holds only immutable configuration; every [`process`](Self::process) call
/// allocates its own tree and [`ProcessorContext`], so one processor can
/// compile any number of documents.
///
/// # Example
///
/// ```no_run
/// use mailtmpl::Processor;
/// use std::path::Path;
///
/// let processor = Processor::new()
///     .with_meta("generator", "mailtmpl")
///     .with_remove_comments(false);
/// let context = processor.process(Path::new("welcome.html")).unwrap();
/// println!("{}", context.html());
/// ```
#[derive(Debug, Clone)]
pub struct Processor {
    add_meta: Vec<(String, String)>,
    remove_comments: bool,
    max_include_depth: usize,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Create a processor with default configuration: no extra meta tags,
    /// comments kept, include depth limited to 32.
    pub fn new() -> Self {
        Self {
            add_meta: Vec::new(),
            remove_comments: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Add a `<meta name=... content=...>` tag to every compiled document's
    /// head.
    pub fn with_meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_meta.push((name.into(), content.into()));
        self
    }

    /// Strip comment nodes from the output. Off by default since conditional
    /// comments are load-bearing for some mail viewers.
    pub fn with_remove_comments(mut self, remove: bool) -> Self {
        self.remove_comments = remove;
        self
    }

    /// Cap how deeply fragment includes may nest. A tag past the limit is
    /// logged and left unresolved rather than failing the compile.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Compile a source file. Included files are resolved relative to the
    /// source file's directory.
    pub fn process(&self, source: &Path) -> Result<ProcessorContext> {
        let content = fs::read_to_string(source)?;
        let base = source.parent().unwrap_or_else(|| Path::new("."));
        self.process_str(&content, base)
    }

    /// Compile a source file and write the minified output to `destination`.
    pub fn process_to(&self, source: &Path, destination: &Path) -> Result<ProcessorContext> {
        let context = self.process(source)?;
        fs::write(destination, context.html())?;
        Ok(context)
    }

    /// Compile from a reader, resolving included files relative to
    /// `base_dir`.
    pub fn process_reader(
        &self,
        mut input: impl Read,
        base_dir: &Path,
    ) -> Result<ProcessorContext> {
        let mut content = String::new();
        input.read_to_string(&mut content)?;
        self.process_str(&content, base_dir)
    }

    /// Compile source text, resolving included files relative to `base_dir`.
    pub fn process_str(&self, content: &str, base_dir: &Path) -> Result<ProcessorContext> {
        let mut context = ProcessorContext::default();
        let mut tree = parse(content)?;

        // Resolve links until a pass makes no progress. Imports splice in
        // new link tags, so one pass is never enough.
        while self.process_links(&mut tree, base_dir, &mut context, 0) {}

        if let Some(html) = tree.first_element_named("html")
            && let Some(template_ref) = tree.attribute(html, TEMPLATE_ATTR).map(str::to_string)
        {
            let template_path = base_dir.join(&template_ref);
            match self.apply_template(&tree, &template_path, &mut context) {
                Ok(template) => {
                    tree = template;
                    while self.process_links(&mut tree, base_dir, &mut context, 0) {}
                }
                Err(err) => {
                    warn!(
                        path = %template_path.display(),
                        error = %err,
                        "failed to load template, compiling the document untemplated"
                    );
                }
            }
        }

        inline_styles(&mut tree)?;

        if let Some(head) = tree.first_element_named("head") {
            for (name, content) in &self.add_meta {
                let meta = tree.new_element("meta");
                tree.set_attribute(meta, "name", name.clone());
                tree.set_attribute(meta, "content", content.clone());
                tree.append_child(head, meta);
            }
        }

        for meta in tree.elements_named("meta") {
            if let (Some(name), Some(value)) = (
                tree.attribute(meta, "name"),
                tree.attribute(meta, "content"),
            ) {
                context.add_meta(name, value);
            }
        }

        context.set_title(title_text(&tree));
        context.set_html(minify(&tree, self.remove_comments));

        Ok(context)
    }

    /// Parse a source file and return only its title text. Returns an empty
    /// string when the file cannot be read or parsed.
    pub fn title_of(&self, source: &Path) -> String {
        fs::read_to_string(source)
            .ok()
            .and_then(|content| parse(&content).ok())
            .map(|tree| title_text(&tree))
            .unwrap_or_default()
    }

    /// Resolve every eligible link tag currently in the tree. Returns true
    /// if any tag was resolved.
    ///
    /// A tag that fails to resolve has already lost its `rel` and `href`
    /// attributes, so later passes skip it instead of retrying forever.
    fn process_links(
        &self,
        tree: &mut Tree,
        base_dir: &Path,
        context: &mut ProcessorContext,
        depth: usize,
    ) -> bool {
        let mut processed = false;

        for link in tree.elements_named(LINK_TAG) {
            let rel = tree.attribute(link, LINK_REL_ATTR);
            let is_stylesheet = rel == Some(LINK_REL_STYLE);
            let is_import = rel == Some(LINK_REL_IMPORT);
            if !is_stylesheet && !is_import {
                continue;
            }

            let Some(href) = tree.attribute(link, LINK_HREF_ATTR).map(str::to_string) else {
                warn!(text = %tree.text_content(link), "link tag is missing its href attribute");
                continue;
            };

            // Nested imports resolve inside out: leave this tag for a later
            // pass until the links under it are gone.
            if is_import && tree.has_descendant_named(link, LINK_TAG) {
                continue;
            }

            let path = base_dir.join(&href);
            tree.remove_attribute(link, LINK_REL_ATTR);
            tree.remove_attribute(link, LINK_HREF_ATTR);

            let result = if is_stylesheet {
                self.resolve_stylesheet(tree, link, &path, context)
            } else {
                self.resolve_import(tree, link, &path, context, depth)
            };

            match result {
                Ok(()) => {
                    tree.detach(link);
                    processed = true;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to resolve link tag");
                }
            }
        }

        processed
    }

    /// Replace a `<link rel="stylesheet">` with a `<style>` block holding the
    /// referenced file's text. The link's remaining attributes (including any
    /// inline marker) carry over to the style block.
    fn resolve_stylesheet(
        &self,
        tree: &mut Tree,
        link: NodeId,
        path: &Path,
        context: &mut ProcessorContext,
    ) -> Result<()> {
        let css = fs::read_to_string(path)?;

        let attributes = match tree.data(link) {
            NodeData::Element { attributes, .. } => attributes.clone(),
            _ => Vec::new(),
        };
        let style = tree.new_node(NodeData::Element {
            name: "style".to_string(),
            attributes,
            self_closing: false,
        });
        let text = tree.new_text(css);
        tree.append_child(style, text);
        tree.insert_after(link, style);

        let kind = if tree.has_attribute(link, LINK_INLINE_ATTR) {
            DependencyKind::StyleInline
        } else {
            DependencyKind::Style
        };
        context.add_dependency(path, kind);
        Ok(())
    }

    /// Splice the fragment referenced by a `<link rel="import">` in place of
    /// the tag, with the tag's `<parameter>` children applied to it.
    fn resolve_import(
        &self,
        tree: &mut Tree,
        link: NodeId,
        path: &Path,
        context: &mut ProcessorContext,
        depth: usize,
    ) -> Result<()> {
        if depth >= self.max_include_depth {
            return Err(ProcessError::IncludeDepthExceeded {
                path: path.to_path_buf(),
                max_depth: self.max_include_depth,
            });
        }

        let mut parameters: HashMap<String, String> = HashMap::new();
        for &child in &tree.children(link).to_vec() {
            if !tree.is_element_named(child, PARAMETER_TAG) {
                continue;
            }
            match tree.attribute(child, PARAMETER_NAME_ATTR) {
                Some(name) => {
                    let value = minify_children(tree, child, false);
                    parameters.insert(name.to_string(), value);
                }
                None => {
                    warn!(path = %path.display(), "include parameter is missing its name attribute");
                }
            }
        }

        let content = fs::read_to_string(path)?;
        let mut fragment = parse(&content)?;

        if !parameters.is_empty() {
            apply_parameters(&mut fragment, &parameters);
            rewrite_conditionals(&mut fragment, &parameters);
        }

        // The fragment's own links resolve against its directory, one level
        // deeper in the include chain.
        let fragment_base = path.parent().unwrap_or_else(|| Path::new("."));
        self.process_links(&mut fragment, fragment_base, context, depth + 1);

        let copies: Vec<NodeId> = fragment
            .children(fragment.root())
            .to_vec()
            .into_iter()
            .map(|child| tree.import_from(&fragment, child))
            .collect();
        tree.insert_all_after(link, &copies);

        context.add_dependency(path, DependencyKind::Fragment);
        Ok(())
    }

    /// Load the base template and merge the document into it: the document's
    /// head content moves to the front of the template's head, and each named
    /// section replaces the template's matching insertion marker. Returns the
    /// merged template tree, which becomes the document.
    fn apply_template(
        &self,
        doc: &Tree,
        path: &Path,
        context: &mut ProcessorContext,
    ) -> Result<Tree> {
        let content = fs::read_to_string(path)?;
        let mut template = parse(&content)?;
        context.add_dependency(path, DependencyKind::Template);

        if let (Some(doc_head), Some(template_head)) = (
            doc.first_element_named("head"),
            template.first_element_named("head"),
        ) {
            let mut anchor: Option<NodeId> = None;
            for &child in doc.children(doc_head) {
                let copy = template.import_from(doc, child);
                match anchor {
                    None => template.prepend_child(template_head, copy),
                    Some(prev) => template.insert_after(prev, copy),
                }
                anchor = Some(copy);
            }
        }

        for section in doc.elements_named(SECTION_TAG) {
            let name = doc.attribute(section, SECTION_NAME_ATTR).unwrap_or_default();
            let marker = template
                .elements_named(INCLUDE_TAG)
                .into_iter()
                .find(|&m| template.attribute(m, INCLUDE_SECTION_ATTR) == Some(name));
            match marker {
                Some(marker) => {
                    let copies: Vec<NodeId> = doc
                        .children(section)
                        .iter()
                        .map(|&child| template.import_from(doc, child))
                        .collect();
                    template.insert_all_after(marker, &copies);
                    template.detach(marker);
                }
                None => {
                    debug!(section = name, "section has no insertion marker in the template");
                }
            }
        }

        Ok(template)
    }
}

fn title_text(tree: &Tree) -> String {
    tree.first_element_named("title")
        .map(|title| tree.text_content(title).trim().to_string())
        .unwrap_or_default()
}

/// Compile a source file with default configuration.
pub fn process(source: &Path) -> Result<ProcessorContext> {
    Processor::new().process(source)
}

/// Compile a source file with default configuration and write the output.
pub fn process_to(source: &Path, destination: &Path) -> Result<ProcessorContext> {
    Processor::new().process_to(source, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_document_passes_through_minified() {
        let context = Processor::new()
            .process_str(
                "<html><head><title>Hi</title></head><body>\n  <p>x</p>\n</body></html>",
                Path::new("."),
            )
            .unwrap();
        assert_eq!(
            context.html(),
            "<html><head><title>Hi</title></head><body> <p>x</p> </body></html>"
        );
        assert_eq!(context.title(), "Hi");
        assert!(context.dependencies().is_empty());
    }

    #[test]
    fn test_meta_injection_and_extraction() {
        let context = Processor::new()
            .with_meta("version", "1.2.3")
            .process_str(
                concat!(
                    r#"<html><head><meta name="author" content="greg"/>"#,
                    r#"<meta charset="utf-8"/></head><body/></html>"#
                ),
                Path::new("."),
            )
            .unwrap();
        // Injected tags are extracted along with authored ones; tags missing
        // name or content are not.
        assert_eq!(context.meta().get("author").map(String::as_str), Some("greg"));
        assert_eq!(context.meta().get("version").map(String::as_str), Some("1.2.3"));
        assert_eq!(context.meta().len(), 2);
        assert!(context.html().contains(r#"<meta name="version" content="1.2.3">"#));
    }

    #[test]
    fn test_remove_comments_configuration() {
        let source = "<html><head></head><body><!-- note --><p>x</p></body></html>";
        let kept = Processor::new().process_str(source, Path::new(".")).unwrap();
        assert!(kept.html().contains("<!-- note -->"));
        let stripped = Processor::new()
            .with_remove_comments(true)
            .process_str(source, Path::new("."))
            .unwrap();
        assert!(!stripped.html().contains("note"));
    }

    #[test]
    fn test_missing_title_is_empty() {
        let context = Processor::new()
            .process_str("<html><head></head><body/></html>", Path::new("."))
            .unwrap();
        assert_eq!(context.title(), "");
    }

    #[test]
    fn test_unknown_link_rel_left_alone() {
        let context = Processor::new()
            .process_str(
                r#"<html><head><link rel="canonical" href="https://x"/></head><body/></html>"#,
                Path::new("."),
            )
            .unwrap();
        assert!(context.html().contains(r#"<link rel="canonical" href="https://x">"#));
        assert!(context.dependencies().is_empty());
    }

    #[test]
    fn test_unresolvable_link_stripped_but_kept() {
        // The file does not exist: the tag stays, minus rel and href, and no
        // dependency is recorded.
        let context = Processor::new()
            .process_str(
                r#"<html><head><link rel="stylesheet" href="missing.css"/></head><body/></html>"#,
                Path::new("/nonexistent"),
            )
            .unwrap();
        assert!(context.html().contains("<link>"));
        assert!(context.dependencies().is_empty());
    }
}
