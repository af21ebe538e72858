//! Strict markup parser building [`Tree`]s from quick-xml events.

use crate::{NodeData, NodeId, ParseError, Result, Tree};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parse markup into a [`Tree`].
///
/// The parser is strict (mismatched or unclosed tags are errors) but accepts
/// more than one top-level node: fragment files are bare sequences of
/// elements, text and comments, all of which become children of the synthetic
/// document root. Character entities are carried through verbatim.
///
/// # Example
///
/// ```rust
/// use mailtmpl_markup::parse;
///
/// let tree = parse("<p>one</p><p>two</p>").unwrap();
/// assert_eq!(tree.children(tree.root()).len(), 2);
/// ```
///
/// # Errors
///
/// Returns a [`ParseError`] if the markup is malformed.
pub fn parse(content: &str) -> Result<Tree> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut tree = Tree::new();
    // Stack of open elements; the document root is the permanent bottom.
    let mut stack: Vec<NodeId> = vec![tree.root()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = make_element(&mut tree, &e, false)?;
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, element);
                stack.push(element);
            }
            Ok(Event::End(e)) => {
                // quick-xml verifies that end tags match; reaching the
                // document root here means a stray closing tag slipped past.
                if stack.len() == 1 {
                    return Err(ParseError::UnexpectedClosingTag {
                        found: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    });
                }
                stack.pop();
            }
            Ok(Event::Empty(e)) => {
                let element = make_element(&mut tree, &e, true)?;
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, element);
            }
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                let node = tree.new_node(NodeData::Text(text));
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, node);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                let node = tree.new_node(NodeData::Text(text));
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, node);
            }
            Ok(Event::Comment(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                let node = tree.new_node(NodeData::Comment(text));
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, node);
            }
            Ok(Event::DocType(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                let (name, public_id, system_id) = parse_doctype(&raw);
                let node = tree.new_node(NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                });
                let parent = *stack.last().expect("stack never empties");
                tree.append_child(parent, node);
            }
            Ok(Event::PI(_) | Event::Decl(_)) => {
                // Processing instructions and XML declarations are dropped;
                // email output never carries them.
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Syntax {
                    message: e.to_string(),
                    position: reader.error_position(),
                });
            }
        }
    }

    if stack.len() > 1 {
        let unclosed = *stack.last().expect("stack never empties");
        return Err(ParseError::UnexpectedEof {
            expected: tree.name(unclosed).unwrap_or_default().to_string(),
        });
    }

    Ok(tree)
}

fn make_element(tree: &mut Tree, e: &BytesStart<'_>, self_closing: bool) -> Result<NodeId> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| ParseError::Attribute {
            tag: name.clone(),
            message: err.to_string(),
        })?;
        attributes.push(crate::Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            // Raw value, entities preserved for the round trip.
            value: String::from_utf8_lossy(&attr.value).into_owned(),
        });
    }

    Ok(tree.new_node(NodeData::Element {
        name,
        attributes,
        self_closing,
    }))
}

/// Split a raw doctype body (`html PUBLIC "..." "..."`) into name, public
/// identifier and system identifier. Missing pieces come back empty.
fn parse_doctype(raw: &str) -> (String, String, String) {
    let mut tokens = DoctypeTokens::new(raw);
    let name = tokens.next().unwrap_or_default();

    let mut public_id = String::new();
    let mut system_id = String::new();
    match tokens.next() {
        Some(kind) if kind.eq_ignore_ascii_case("PUBLIC") => {
            public_id = tokens.next().unwrap_or_default();
            system_id = tokens.next().unwrap_or_default();
        }
        Some(kind) if kind.eq_ignore_ascii_case("SYSTEM") => {
            system_id = tokens.next().unwrap_or_default();
        }
        _ => {}
    }

    (name, public_id, system_id)
}

/// Tokenizer for doctype bodies: whitespace-separated words, with single- or
/// double-quoted strings yielded without their quotes.
struct DoctypeTokens<'a> {
    rest: &'a str,
}

impl<'a> DoctypeTokens<'a> {
    fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }
}

impl Iterator for DoctypeTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.rest = self.rest.trim_start();
        if self.rest.is_empty() {
            return None;
        }

        let first = self.rest.chars().next()?;
        if first == '"' || first == '\'' {
            let body = &self.rest[1..];
            match body.find(first) {
                Some(end) => {
                    let token = body[..end].to_string();
                    self.rest = &body[end + 1..];
                    Some(token)
                }
                None => {
                    let token = body.to_string();
                    self.rest = "";
                    Some(token)
                }
            }
        } else {
            let end = self
                .rest
                .find(char::is_whitespace)
                .unwrap_or(self.rest.len());
            let token = self.rest[..end].to_string();
            self.rest = &self.rest[end..];
            Some(token)
        }
    }
}
