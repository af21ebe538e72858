//! Parameter substitution inside imported fragments.
//!
//! Fragments declare insertion points with `<parameter name="x"/>` tags. The
//! include site supplies values; this module walks a fragment tree and
//! resolves every placeholder against the supplied set.

use mailtmpl_markup::{Tree, parse};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Resolve every `<parameter name=...>` placeholder in `tree`.
///
/// A placeholder with an `attr` attribute does not insert content; instead
/// its value is written onto the named attribute of the placeholder's parent
/// element, space-joined after any existing value, and the placeholder is
/// removed. Otherwise the value is parsed as a markup fragment and spliced
/// where the placeholder stood.
///
/// A placeholder whose name has no supplied value is left in place (a later
/// pass may still resolve it); placeholders without a `name` attribute are
/// ignored.
pub(crate) fn apply_parameters(tree: &mut Tree, parameters: &HashMap<String, String>) {
    for placeholder in tree.elements_named("parameter") {
        let Some(name) = tree.attribute(placeholder, "name").map(str::to_string) else {
            continue;
        };
        let Some(value) = parameters.get(&name) else {
            warn!(parameter = %name, "no value supplied for parameter");
            continue;
        };

        if let Some(attr_name) = tree.attribute(placeholder, "attr").map(str::to_string) {
            let Some(parent) = tree.parent(placeholder) else {
                continue;
            };
            let combined = match tree.attribute(parent, &attr_name) {
                Some(existing) => format!("{existing} {value}"),
                None => value.clone(),
            };
            tree.set_attribute(parent, &attr_name, combined);
            tree.detach(placeholder);
        } else {
            match parse(value) {
                Ok(fragment) => {
                    let copies: Vec<_> = fragment
                        .children(fragment.root())
                        .to_vec()
                        .into_iter()
                        .map(|child| tree.import_from(&fragment, child))
                        .collect();
                    tree.insert_all_after(placeholder, &copies);
                    tree.detach(placeholder);
                }
                Err(err) => {
                    debug!(parameter = %name, error = %err, "parameter value is not parseable markup");
                }
            }
        }
    }
}
