//! Selector parsing and tree matching.

use crate::{CssError, Result};
use mailtmpl_markup::{NodeData, NodeId, Tree};

/// A parsed selector, possibly a comma group of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

/// A compound sequence joined by combinators, stored rightmost-first so
/// matching can walk up from the candidate element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// The subject compound (rightmost in source order).
    subject: Compound,
    /// Ancestor constraints, nearest first.
    ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One simple-selector sequence with no combinators, e.g. `td.cell[align]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Present(String),
    Equals(String, String),
}

impl Selector {
    /// Parse selector text, including comma groups.
    ///
    /// # Errors
    ///
    /// Returns an error for empty selectors, unknown combinators and
    /// malformed simple selectors (e.g. a bare `.` or unclosed `[`).
    pub fn parse(text: &str) -> Result<Selector> {
        let mut alternatives = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid(text, "empty selector in comma group"));
            }
            alternatives.push(parse_complex(part)?);
        }
        if alternatives.is_empty() {
            return Err(invalid(text, "empty selector"));
        }
        Ok(Selector { alternatives })
    }

    /// True if the element `id` matches any alternative of this selector.
    pub fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        if !matches!(tree.data(id), NodeData::Element { .. }) {
            return false;
        }
        self.alternatives.iter().any(|c| complex_matches(c, tree, id))
    }

    /// All matching elements, in document order.
    pub fn select(&self, tree: &Tree) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

fn invalid(selector: &str, message: &str) -> CssError {
    CssError::InvalidSelector {
        selector: selector.to_string(),
        message: message.to_string(),
    }
}

fn parse_complex(text: &str) -> Result<Complex> {
    // Tokenize into compounds and combinators. `>` binds as a child
    // combinator regardless of surrounding whitespace.
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in text.split_whitespace() {
        for (i, piece) in token.split('>').enumerate() {
            if i > 0 {
                if pending.is_some() {
                    return Err(invalid(text, "consecutive combinators"));
                }
                pending = Some(Combinator::Child);
            }
            if piece.is_empty() {
                continue;
            }
            if !compounds.is_empty() {
                combinators.push(pending.take().unwrap_or(Combinator::Descendant));
            } else if pending.is_some() {
                return Err(invalid(text, "selector starts with a combinator"));
            }
            compounds.push(parse_compound(piece, text)?);
        }
    }

    if pending.is_some() {
        return Err(invalid(text, "selector ends with a combinator"));
    }
    let Some(subject) = compounds.pop() else {
        return Err(invalid(text, "empty selector"));
    };

    // Pair each remaining compound with the combinator to its right, so
    // ancestors read nearest-first during matching.
    let mut ancestors: Vec<(Combinator, Compound)> = combinators.into_iter().zip(compounds).collect();
    ancestors.reverse();

    Ok(Complex { subject, ancestors })
}

fn parse_compound(text: &str, whole: &str) -> Result<Compound> {
    let mut compound = Compound::default();
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'*' => {
                pos += 1;
            }
            b'.' => {
                let (name, next) = take_name(text, pos + 1);
                if name.is_empty() {
                    return Err(invalid(whole, "class selector with no name"));
                }
                compound.classes.push(name.to_string());
                pos = next;
            }
            b'#' => {
                let (name, next) = take_name(text, pos + 1);
                if name.is_empty() {
                    return Err(invalid(whole, "id selector with no name"));
                }
                compound.id = Some(name.to_string());
                pos = next;
            }
            b'[' => {
                let Some(close) = text[pos..].find(']').map(|i| pos + i) else {
                    return Err(invalid(whole, "unclosed attribute selector"));
                };
                let inner = &text[pos + 1..close];
                compound.attrs.push(parse_attr_test(inner, whole)?);
                pos = close + 1;
            }
            _ => {
                let (name, next) = take_name(text, pos);
                if name.is_empty() || pos != 0 {
                    return Err(invalid(whole, "unexpected character in selector"));
                }
                compound.tag = Some(name.to_string());
                pos = next;
            }
        }
    }

    Ok(compound)
}

fn parse_attr_test(inner: &str, whole: &str) -> Result<AttrTest> {
    match inner.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid(whole, "attribute selector with no name"));
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Ok(AttrTest::Equals(name.to_string(), value.to_string()))
        }
        None => {
            let name = inner.trim();
            if name.is_empty() {
                return Err(invalid(whole, "attribute selector with no name"));
            }
            Ok(AttrTest::Present(name.to_string()))
        }
    }
}

/// Consume an identifier (tag, class or id name) starting at `pos`.
fn take_name(text: &str, pos: usize) -> (&str, usize) {
    let end = text[pos..]
        .find(|c: char| matches!(c, '.' | '#' | '[' | '*'))
        .map_or(text.len(), |i| pos + i);
    (&text[pos..end], end)
}

fn complex_matches(complex: &Complex, tree: &Tree, id: NodeId) -> bool {
    compound_matches(&complex.subject, tree, id) && ancestors_match(&complex.ancestors, tree, id)
}

/// Match the ancestor constraints of `current`, nearest-first.
///
/// A descendant step may be satisfiable by several ancestors; each candidate
/// is tried in turn so a later child step can still succeed against a farther
/// one.
fn ancestors_match(ancestors: &[(Combinator, Compound)], tree: &Tree, current: NodeId) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => {
            let Some(parent) = tree.parent(current) else {
                return false;
            };
            compound_matches(compound, tree, parent) && ancestors_match(rest, tree, parent)
        }
        Combinator::Descendant => {
            let mut candidate = tree.parent(current);
            while let Some(ancestor) = candidate {
                if compound_matches(compound, tree, ancestor)
                    && ancestors_match(rest, tree, ancestor)
                {
                    return true;
                }
                candidate = tree.parent(ancestor);
            }
            false
        }
    }
}

fn compound_matches(compound: &Compound, tree: &Tree, id: NodeId) -> bool {
    let Some(name) = tree.name(id) else {
        return false;
    };
    if let Some(tag) = &compound.tag
        && !name.eq_ignore_ascii_case(tag)
    {
        return false;
    }
    if let Some(want) = &compound.id
        && tree.attribute(id, "id") != Some(want.as_str())
    {
        return false;
    }
    for class in &compound.classes {
        let listed = tree
            .attribute(id, "class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class));
        if !listed {
            return false;
        }
    }
    for test in &compound.attrs {
        let ok = match test {
            AttrTest::Present(attr) => tree.has_attribute(id, attr),
            AttrTest::Equals(attr, value) => tree.attribute(id, attr) == Some(value.as_str()),
        };
        if !ok {
            return false;
        }
    }
    true
}
