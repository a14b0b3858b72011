//! Allow-list sanitizer for rich content values.
//!
//! The pass runs in three steps over a parsed tree: drop `script` subtrees,
//! strip event-handler and script-URI attributes, then replace every element
//! outside [`ALLOWED_TAGS`] by a bare `span` holding its text (or remove it
//! when it has none).

use super::dom::{parse_fragment, Attribute, Document, NodeId};

/// Tags that survive sanitization unchanged.
pub const ALLOWED_TAGS: [&str; 11] = [
    "b", "strong", "i", "em", "u", "ul", "ol", "li", "br", "p", "div",
];

const SCRIPT_SCHEMES: [&str; 2] = ["javascript:", "vbscript:"];

pub fn is_allowed_tag(tag: &str) -> bool {
    ALLOWED_TAGS.contains(&tag)
}

/// Sanitize a markup string and return the serialized result.
pub fn sanitize_html(markup: &str) -> String {
    let mut doc = parse_fragment(markup);
    let root = doc.root();
    sanitize_document(&mut doc, root);
    doc.inner_html(root)
}

/// Sanitize the subtree under `root` in place.
///
/// Text nodes that are not inside a replaced element keep their [`NodeId`].
pub fn sanitize_document(doc: &mut Document, root: NodeId) {
    for id in doc.descendant_elements(root) {
        if doc.tag(id) == Some("script") {
            doc.detach(id);
        }
    }

    for id in doc.descendant_elements(root) {
        doc.retain_attrs(id, |attr| !is_unsafe_attribute(attr));
    }

    replace_disallowed(doc, root);
}

fn is_unsafe_attribute(attr: &Attribute) -> bool {
    attr.name.to_ascii_lowercase().starts_with("on") || is_script_uri(&attr.value)
}

fn is_script_uri(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    SCRIPT_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

fn replace_disallowed(doc: &mut Document, parent: NodeId) {
    for child in doc.children(parent).to_vec() {
        let allowed = match doc.tag(child) {
            Some(tag) => is_allowed_tag(tag),
            None => continue,
        };
        if allowed {
            replace_disallowed(doc, child);
            continue;
        }

        let text = doc.text_content(child);
        if text.is_empty() {
            doc.detach(child);
        } else {
            let span = doc.create_element("span", Vec::new());
            let text = doc.create_text(text);
            doc.append(span, text);
            doc.replace(child, span);
        }
    }
}
