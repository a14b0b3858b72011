//! Print snapshot of a rendered preview.
//!
//! The preview markup is re-parsed into a private tree (the caller's copy is
//! never touched), its root gets fixed print styles and the result is wrapped
//! in a standalone HTML document ready for rasterization.

use crate::richtext::dom::{escape_text, parse_fragment, Document, NodeData, NodeId};
use crate::templates::render::RICH_CONTENT_CLASS;

use super::PdfError;

const ROOT_STYLES: [(&str, &str); 5] = [
    ("font-family", "Arial, sans-serif"),
    ("font-size", "12px"),
    ("line-height", "1.6"),
    ("color", "black"),
    ("background-color", "white"),
];

const RICH_CONTENT_STYLES: [(&str, &str); 2] =
    [("line-height", "1.6"), ("word-wrap", "break-word")];

const CONTAINER_STYLES: [(&str, &str); 3] = [
    ("width", "210mm"),
    ("padding", "20mm"),
    ("box-sizing", "border-box"),
];

/// Build the standalone print document for `preview_html`.
pub fn prepare(preview_html: &str) -> Result<String, PdfError> {
    prepare_titled(preview_html, "Document")
}

pub fn prepare_titled(preview_html: &str, title: &str) -> Result<String, PdfError> {
    let mut doc = parse_fragment(preview_html);
    let root = locate_root(&mut doc).ok_or(PdfError::MissingContent)?;

    let style = merge_style(doc.attr(root, "style").unwrap_or_default(), &ROOT_STYLES);
    doc.set_attr(root, "style", style);

    for id in doc.descendant_elements(root) {
        let rich = doc
            .attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == RICH_CONTENT_CLASS));
        if rich {
            let style = merge_style(doc.attr(id, "style").unwrap_or_default(), &RICH_CONTENT_STYLES);
            doc.set_attr(id, "style", style);
        }
    }

    Ok(format!(
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>",
            "<body style=\"margin:0;background-color:white\">{}</body></html>"
        ),
        escape_text(title),
        doc.outer_html(root)
    ))
}

/// Wrap loose markup in a page-width container before preparing it.
pub fn prepare_markup(markup: &str, title: &str) -> Result<String, PdfError> {
    let style = merge_style("", &CONTAINER_STYLES);
    prepare_titled(&format!(r#"<div style="{style}">{markup}</div>"#), title)
}

/// The single element to print. Several top-level nodes get a `div` wrapper;
/// markup without any visible content yields `None`.
fn locate_root(doc: &mut Document) -> Option<NodeId> {
    let fragment = doc.root();
    let children = doc.children(fragment).to_vec();
    let visible: Vec<NodeId> = children
        .iter()
        .copied()
        .filter(|&id| match doc.data(id) {
            NodeData::Text(text) => !text.trim().is_empty(),
            _ => true,
        })
        .collect();

    match visible.as_slice() {
        [] => None,
        [only] if doc.tag(*only).is_some() => Some(*only),
        _ => {
            let wrapper = doc.create_element("div", Vec::new());
            doc.move_children(fragment, wrapper);
            doc.append(fragment, wrapper);
            Some(wrapper)
        }
    }
}

/// Apply `overrides` to an inline style declaration list, keeping unrelated
/// declarations in their original order.
pub fn merge_style(existing: &str, overrides: &[(&str, &str)]) -> String {
    let mut declarations: Vec<(String, String)> = existing
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect();

    for (name, value) in overrides {
        match declarations.iter_mut().find(|(n, _)| n == name) {
            Some(decl) => decl.1 = value.to_string(),
            None => declarations.push((name.to_string(), value.to_string())),
        }
    }

    declarations
        .iter()
        .map(|(n, v)| format!("{n}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
