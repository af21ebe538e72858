//! Style inlining.
//!
//! Email clients widely ignore `<style>` blocks, so rules from stylesheets
//! marked for inlining are converted into per-element `style` attributes.
//! Only style blocks carrying the `ui:inline` marker attribute participate;
//! unmarked blocks are left in the document for clients that do honor them.

use crate::Result;
use indexmap::IndexMap;
use mailtmpl_css::{Selector, parse_stylesheet};
use mailtmpl_markup::{NodeId, Tree};
use std::collections::HashMap;
use tracing::debug;

const INLINE_MARKER_ATTR: &str = "ui:inline";

/// Drain marked style blocks and inline their rules into `style` attributes.
///
/// Rules apply in source order and later rules overwrite earlier values for
/// the same property; any pre-existing inline `style` value is appended after
/// the generated declarations so it takes precedence. The `class` attribute
/// is removed from every element that received styles. Rules whose selector
/// contains `:` (pseudo-classes have no inline equivalent) are skipped, as
/// are selectors outside the supported subset.
pub(crate) fn inline_styles(tree: &mut Tree) -> Result<()> {
    let mut css = String::new();
    for style in tree.elements_named("style") {
        if tree.has_attribute(style, INLINE_MARKER_ATTR) {
            css.push_str(&tree.text_content(style));
            tree.detach(style);
        }
    }
    if css.trim().is_empty() {
        return Ok(());
    }

    let sheet = parse_stylesheet(&css)?;

    let mut element_styles: HashMap<NodeId, IndexMap<String, String>> = HashMap::new();
    for rule in &sheet.rules {
        if rule.selector.contains(':') {
            continue;
        }
        let selector = match Selector::parse(&rule.selector) {
            Ok(selector) => selector,
            Err(err) => {
                debug!(selector = %rule.selector, error = %err, "skipping unsupported selector");
                continue;
            }
        };
        for id in selector.select(tree) {
            let styles = element_styles.entry(id).or_default();
            for decl in &rule.declarations {
                styles.insert(decl.property.clone(), decl.value.clone());
            }
        }
    }

    for (id, styles) in element_styles {
        let mut value = String::new();
        for (property, val) in &styles {
            value.push_str(property);
            value.push(':');
            value.push_str(val);
            value.push(';');
        }
        if let Some(existing) = tree.attribute(id, "style") {
            value.push_str(existing);
        }
        tree.set_attribute(id, "style", value);
        tree.remove_attribute(id, "class");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailtmpl_markup::{minify, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marked_style_block_inlined_and_removed() {
        let mut tree = parse(concat!(
            r#"<html><head><style ui:inline="true">td { color: red }</style></head>"#,
            "<body><td>x</td></body></html>"
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        assert_eq!(
            minify(&tree, false),
            r#"<html><head></head><body><td style="color:red;">x</td></body></html>"#
        );
    }

    #[test]
    fn test_unmarked_style_block_left_alone() {
        let mut tree =
            parse("<html><head><style>td { color: red }</style></head><body><td>x</td></body></html>")
                .unwrap();
        inline_styles(&mut tree).unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(tree.attribute(td, "style"), None);
        assert!(tree.first_element_named("style").is_some());
    }

    #[test]
    fn test_later_rule_wins_per_property() {
        let mut tree = parse(concat!(
            r#"<style ui:inline="true">"#,
            ".a { color: red; border: 1px } .a { color: blue }",
            r#"</style><td class="a">x</td>"#
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(tree.attribute(td, "style"), Some("color:blue;border:1px;"));
    }

    #[test]
    fn test_existing_inline_style_appended_last() {
        let mut tree = parse(concat!(
            r#"<style ui:inline="true">td { color: red }</style>"#,
            r#"<td style="color:green">x</td>"#
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(tree.attribute(td, "style"), Some("color:red;color:green"));
    }

    #[test]
    fn test_class_attribute_removed_from_styled_elements() {
        let mut tree = parse(concat!(
            r#"<style ui:inline="true">.btn { color: red }</style>"#,
            r#"<td class="btn">x</td><td class="other">y</td>"#
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        let tds = tree.elements_named("td");
        assert_eq!(tree.attribute(tds[0], "class"), None);
        assert_eq!(tree.attribute(tds[1], "class"), Some("other"));
    }

    #[test]
    fn test_pseudo_selector_rules_skipped() {
        let mut tree = parse(concat!(
            r#"<style ui:inline="true">a:hover { color: red } a { color: blue }</style>"#,
            "<a>x</a>"
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        let a = tree.first_element_named("a").unwrap();
        assert_eq!(tree.attribute(a, "style"), Some("color:blue;"));
    }

    #[test]
    fn test_multiple_marked_blocks_concatenated_in_order() {
        let mut tree = parse(concat!(
            r#"<style ui:inline="true">td { color: red }</style>"#,
            r#"<style ui:inline="true">td { color: blue }</style>"#,
            "<td>x</td>"
        ))
        .unwrap();
        inline_styles(&mut tree).unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(tree.attribute(td, "style"), Some("color:blue;"));
        assert!(tree.first_element_named("style").is_none());
    }

    #[test]
    fn test_no_marked_styles_is_a_no_op() {
        let mut tree = parse("<td class=\"a\">x</td>").unwrap();
        inline_styles(&mut tree).unwrap();
        let td = tree.first_element_named("td").unwrap();
        assert_eq!(tree.attribute(td, "class"), Some("a"));
    }
}
