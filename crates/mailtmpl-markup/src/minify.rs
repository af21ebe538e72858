//! Minifying serializer.
//!
//! Walks a [`Tree`] once, pre-order with a matching post-order close, and
//! emits a single compact stream: no indentation, no line breaks, whitespace
//! runs in text and comments collapsed to one space. Email clients are served
//! byte-for-byte what this produces, so the exact-markup rules (void
//! elements, self-closing forms, doctype reconstruction) live here.

use crate::{NodeData, NodeId, Tree};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// HTML void elements: childless by definition, closed with a bare `>`.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t))
}

/// Serialize a tree to minified markup text.
///
/// With `remove_comments` set, comment nodes are dropped from the output
/// entirely; conditional comments for specific mail viewers should therefore
/// only be stripped when the operator knows none are in use.
pub fn minify(tree: &Tree, remove_comments: bool) -> String {
    let mut out = String::new();
    write_node(tree, tree.root(), remove_comments, &mut out);
    out
}

/// Serialize only the children of `id`, in order.
///
/// This is the inner-markup form used when a subtree's content is lifted out
/// as text, for example when capturing an include parameter value.
pub fn minify_children(tree: &Tree, id: NodeId, remove_comments: bool) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        write_node(tree, child, remove_comments, &mut out);
    }
    out
}

fn write_node(tree: &Tree, id: NodeId, remove_comments: bool, out: &mut String) {
    match tree.data(id) {
        NodeData::Document => {
            for &child in tree.children(id) {
                write_node(tree, child, remove_comments, out);
            }
        }
        NodeData::Doctype {
            public_id,
            system_id,
            ..
        } => {
            out.push_str("<!DOCTYPE html PUBLIC");
            if !public_id.is_empty() {
                out.push(' ');
                out.push_str(public_id);
            }
            if !system_id.is_empty() {
                out.push(' ');
                out.push_str(system_id);
            }
            out.push('>');
        }
        NodeData::Element {
            name,
            attributes,
            self_closing,
        } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&attr.value.replace('"', "&quot;"));
                out.push('"');
            }

            let childless = tree.children(id).is_empty();
            if childless && (*self_closing || is_void(name)) {
                // Void elements take the bare form; everything else parsed
                // as `<x/>` keeps the explicit self-closing form.
                if is_void(name) {
                    out.push('>');
                } else {
                    out.push_str(" />");
                }
            } else {
                out.push('>');
                for &child in tree.children(id) {
                    write_node(tree, child, remove_comments, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        NodeData::Text(text) => {
            out.push_str(&WHITESPACE_RUN.replace_all(text, " "));
        }
        NodeData::Comment(text) => {
            if !remove_comments {
                out.push_str("<!--");
                out.push_str(&WHITESPACE_RUN.replace_all(text, " "));
                out.push_str("-->");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minify_collapses_whitespace() {
        let tree = parse("<p>Hello\n\t  world</p>").unwrap();
        assert_eq!(minify(&tree, false), "<p>Hello world</p>");
    }

    #[test]
    fn test_minify_keeps_leading_and_trailing_space() {
        // Collapsed, not trimmed: inter-element spacing matters inline.
        let tree = parse("<p><b>a</b> <i>b</i></p>").unwrap();
        assert_eq!(minify(&tree, false), "<p><b>a</b> <i>b</i></p>");
    }

    #[test]
    fn test_minify_void_element_bare_close() {
        let tree = parse(r#"<img src="logo.png"/>"#).unwrap();
        assert_eq!(minify(&tree, false), r#"<img src="logo.png">"#);
    }

    #[test]
    fn test_minify_non_void_self_closing() {
        let tree = parse("<spacer/>").unwrap();
        assert_eq!(minify(&tree, false), "<spacer />");
    }

    #[test]
    fn test_minify_element_with_children_never_self_closes() {
        let tree = parse("<div><div>x</div></div>").unwrap();
        assert_eq!(minify(&tree, false), "<div><div>x</div></div>");
    }

    #[test]
    fn test_minify_empty_non_void_gets_close_tag() {
        let tree = parse("<td></td>").unwrap();
        assert_eq!(minify(&tree, false), "<td></td>");
    }

    #[test]
    fn test_minify_doctype_reconstruction() {
        let tree = parse(concat!(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" ",
            "\"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">",
            "<html/>"
        ))
        .unwrap();
        let html = minify(&tree, false);
        assert!(html.starts_with(
            "<!DOCTYPE html PUBLIC -//W3C//DTD XHTML 1.0 Strict//EN \
             http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd>"
        ));
    }

    #[test]
    fn test_minify_comments_kept_by_default() {
        let tree = parse("<div><!--[if mso]>\n  <p>x</p>\n<![endif]--></div>").unwrap();
        assert_eq!(
            minify(&tree, false),
            "<div><!--[if mso]> <p>x</p> <![endif]--></div>"
        );
    }

    #[test]
    fn test_minify_comments_removed_when_configured() {
        let tree = parse("<div><!-- gone --><p>x</p></div>").unwrap();
        assert_eq!(minify(&tree, true), "<div><p>x</p></div>");
    }

    #[test]
    fn test_minify_escapes_quotes_in_attributes() {
        let mut tree = parse("<p/>").unwrap();
        let p = tree.first_element_named("p").unwrap();
        tree.set_attribute(p, "title", "say \"hi\"");
        assert_eq!(minify(&tree, false), r#"<p title="say &quot;hi&quot;" />"#);
    }

    #[test]
    fn test_minify_children_skips_outer_tag() {
        let tree = parse("<td>Hello <b>there</b></td>").unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(minify_children(&tree, td, false), "Hello <b>there</b>");
    }

    #[test]
    fn test_minify_then_reparse_is_stable() {
        let source = r#"<html><head><title>T</title></head><body>
            <p class="a">Hello   <b>there</b></p>
        </body></html>"#;
        let first = minify(&parse(source).unwrap(), false);
        let second = minify(&parse(&first).unwrap(), false);
        assert_eq!(first, second);
    }
}
