//! Stylesheet parsing into flat selector/declaration rules.

use crate::{CssError, Result};

/// An ordered sequence of style rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

/// A single `selector { declarations }` rule.
///
/// The selector is kept as written (trimmed); splitting comma groups and
/// matching is the selector module's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

/// A single `property: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Parse a stylesheet body into an ordered list of rules.
///
/// Comments are stripped first. At-rules are skipped in full: statement
/// at-rules (`@import ...;`) up to the semicolon, block at-rules
/// (`@media { ... }`) including everything inside their braces — nested
/// rules never surface. Declarations without a colon are ignored.
///
/// # Errors
///
/// Returns an error only for structurally broken input (a block or at-rule
/// opened and never closed).
pub fn parse_stylesheet(text: &str) -> Result<Stylesheet> {
    let text = strip_comments(text);
    let bytes = text.as_bytes();
    let mut rules = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // Skip leading whitespace
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        if bytes[pos] == b'@' {
            pos = skip_at_rule(&text, pos)?;
            continue;
        }

        let Some(brace) = text[pos..].find('{').map(|i| pos + i) else {
            // Trailing junk with no block; nothing more to parse.
            break;
        };
        let selector = text[pos..brace].trim().to_string();

        let Some(close) = text[brace + 1..].find('}').map(|i| brace + 1 + i) else {
            return Err(CssError::UnclosedBlock { selector });
        };

        let declarations = parse_declarations(&text[brace + 1..close]);
        if !selector.is_empty() {
            rules.push(Rule {
                selector,
                declarations,
            });
        }
        pos = close + 1;
    }

    Ok(Stylesheet { rules })
}

fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    // Split on `;` only outside parentheses; values like
    // `url(data:image/png;base64,...)` carry semicolons of their own.
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                declarations.extend(parse_declaration(&body[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    declarations.extend(parse_declaration(&body[start..]));
    declarations
}

fn parse_declaration(decl: &str) -> Option<Declaration> {
    let (property, value) = decl.split_once(':')?;
    let property = property.trim();
    let value = value.trim();
    if property.is_empty() || value.is_empty() {
        return None;
    }
    Some(Declaration {
        property: property.to_string(),
        value: value.to_string(),
    })
}

/// Skip an at-rule starting at `pos` (which points at `@`). Returns the
/// position just past the rule. A stray `}` before any block opens also ends
/// the rule, so malformed input cannot push the brace depth negative.
fn skip_at_rule(text: &str, pos: usize) -> Result<usize> {
    let name_end = text[pos..]
        .find(|c: char| c.is_whitespace() || c == '{' || c == ';')
        .map_or(text.len(), |i| pos + i);
    let name = text[pos..name_end].to_string();

    let mut depth = 0usize;
    for (i, c) in text[pos..].char_indices() {
        match c {
            ';' if depth == 0 => return Ok(pos + i + 1),
            '{' => depth += 1,
            '}' => {
                if depth <= 1 {
                    return Ok(pos + i + 1);
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    Err(CssError::UnclosedAtRule { name })
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out, // unterminated comment swallows the rest
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_rule() {
        let sheet = parse_stylesheet("p { color: red; font-size: 12px }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector, "p");
        assert_eq!(
            sheet.rules[0].declarations,
            vec![
                Declaration {
                    property: "color".to_string(),
                    value: "red".to_string()
                },
                Declaration {
                    property: "font-size".to_string(),
                    value: "12px".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_preserves_rule_order() {
        let sheet = parse_stylesheet(".a { color: red } .b { color: blue }").unwrap();
        let selectors: Vec<&str> = sheet.rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec![".a", ".b"]);
    }

    #[test]
    fn test_parse_keeps_comma_group_selector_text() {
        let sheet = parse_stylesheet("h1, h2 { margin: 0 }").unwrap();
        assert_eq!(sheet.rules[0].selector, "h1, h2");
    }

    #[test]
    fn test_parse_strips_comments() {
        let sheet =
            parse_stylesheet("/* lead */ p { /* inner */ color: red } /* trail */").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations.len(), 1);
    }

    #[test]
    fn test_parse_skips_statement_at_rule() {
        let sheet = parse_stylesheet("@import url(x.css); p { color: red }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector, "p");
    }

    #[test]
    fn test_parse_skips_block_at_rule_with_nested_rules() {
        let css = "@media screen { p { color: blue } } td { color: red }";
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector, "td");
    }

    #[test]
    fn test_parse_at_rule_with_stray_closing_brace() {
        // A `}` before the at-rule opens a block ends the rule instead of
        // corrupting the brace count.
        let sheet = parse_stylesheet("@media x } p { color: red }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector, "p");
    }

    #[test]
    fn test_parse_ignores_malformed_declarations() {
        let sheet = parse_stylesheet("p { color red; border: 1px; ; }").unwrap();
        assert_eq!(
            sheet.rules[0].declarations,
            vec![Declaration {
                property: "border".to_string(),
                value: "1px".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_value_keeps_inner_colons() {
        let sheet = parse_stylesheet("p { background: url(http://x/y.png) }").unwrap();
        assert_eq!(sheet.rules[0].declarations[0].value, "url(http://x/y.png)");
    }

    #[test]
    fn test_parse_value_keeps_semicolons_inside_parens() {
        let sheet =
            parse_stylesheet("p { background: url(data:image/png;base64,AAAA); color: red }")
                .unwrap();
        assert_eq!(
            sheet.rules[0].declarations,
            vec![
                Declaration {
                    property: "background".to_string(),
                    value: "url(data:image/png;base64,AAAA)".to_string()
                },
                Declaration {
                    property: "color".to_string(),
                    value: "red".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_unclosed_block_is_error() {
        let result = parse_stylesheet("p { color: red");
        assert!(matches!(result, Err(CssError::UnclosedBlock { .. })));
    }

    #[test]
    fn test_parse_empty_input() {
        let sheet = parse_stylesheet("   \n ").unwrap();
        assert!(sheet.rules.is_empty());
    }
}
