//! Parameter substitution inside conditional comments.
//!
//! Some mail viewers (notably Microsoft Office) only honor markup wrapped in
//! conditional comments, e.g. `<!--[if mso]> ... <![endif]-->`. The markup
//! parser treats everything between the comment markers as opaque text, so
//! parameter placeholders hiding inside would otherwise never be resolved.
//! This module cracks such comments open, substitutes, and rebuilds them.

use crate::params::apply_parameters;
use mailtmpl_markup::{NodeData, Tree, minify, parse};
use std::collections::HashMap;
use tracing::debug;

/// Rewrite every conditional comment in `tree` with parameters applied.
///
/// The comment text is split at the first `>` (end of the opening marker) and
/// the first `<!` after it (start of the closing marker); the body between is
/// parsed as a fragment, substituted and re-serialized compactly between the
/// original markers. Comments that do not split cleanly are left untouched.
pub(crate) fn rewrite_conditionals(tree: &mut Tree, parameters: &HashMap<String, String>) {
    for id in tree.descendants(tree.root()) {
        let NodeData::Comment(text) = tree.data(id) else {
            continue;
        };
        let text = text.clone();
        if let Some(rewritten) = rewrite(&text, parameters) {
            *tree.data_mut(id) = NodeData::Comment(rewritten);
        }
    }
}

fn rewrite(comment: &str, parameters: &HashMap<String, String>) -> Option<String> {
    let open_end = comment.find('>')? + 1;
    let close_start = comment.find("<!")?;
    if close_start < open_end {
        debug!(comment, "comment markers out of order, leaving as-is");
        return None;
    }

    let open = &comment[..open_end];
    let close = &comment[close_start..];
    let body = &comment[open_end..close_start];

    let mut fragment = match parse(body) {
        Ok(fragment) => fragment,
        Err(err) => {
            debug!(error = %err, "conditional comment body is not parseable markup");
            return None;
        }
    };
    apply_parameters(&mut fragment, parameters);

    Some(format!("{open}{}{close}", minify(&fragment, false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn first_comment(tree: &Tree) -> String {
        tree.descendants(tree.root())
            .into_iter()
            .find_map(|id| match tree.data(id) {
                NodeData::Comment(text) => Some(text.clone()),
                _ => None,
            })
            .expect("no comment in tree")
    }

    #[test]
    fn test_substitutes_inside_conditional() {
        let mut tree = parse(
            r#"<div><!--[if mso]><td><parameter name="w"/></td><![endif]--></div>"#,
        )
        .unwrap();
        rewrite_conditionals(&mut tree, &params(&[("w", "600")]));
        assert_eq!(first_comment(&tree), "[if mso]><td>600</td><![endif]");
    }

    #[test]
    fn test_plain_comment_untouched() {
        let mut tree = parse("<div><!-- just a note --></div>").unwrap();
        rewrite_conditionals(&mut tree, &params(&[("w", "600")]));
        assert_eq!(first_comment(&tree), " just a note ");
    }

    #[test]
    fn test_comment_without_closing_marker_untouched() {
        let mut tree = parse("<div><!--[if mso]> no closer --></div>").unwrap();
        rewrite_conditionals(&mut tree, &params(&[]));
        assert_eq!(first_comment(&tree), "[if mso]> no closer ");
    }

    #[test]
    fn test_nested_comments_found_at_depth() {
        let mut tree = parse(concat!(
            "<table><tr><td>",
            r#"<!--[if mso]><p><parameter name="x"/></p><![endif]-->"#,
            "</td></tr></table>"
        ))
        .unwrap();
        rewrite_conditionals(&mut tree, &params(&[("x", "hi")]));
        assert_eq!(first_comment(&tree), "[if mso]><p>hi</p><![endif]");
    }

    #[test]
    fn test_attr_parameter_works_inside_conditional() {
        let mut tree = parse(concat!(
            "<div><!--[if mso]>",
            r#"<td><parameter name="c" attr="class"/>x</td>"#,
            "<![endif]--></div>"
        ))
        .unwrap();
        rewrite_conditionals(&mut tree, &params(&[("c", "mso-cell")]));
        assert_eq!(
            first_comment(&tree),
            r#"[if mso]><td class="mso-cell">x</td><![endif]"#
        );
    }
}
