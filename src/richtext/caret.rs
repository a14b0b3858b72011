//! Caret capture and restoration across tree rewrites.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::dom::{Document, NodeId};

/// A caret expressed the way a host reports it: the index of a text node in
/// document order plus a character offset inside that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CaretPosition {
    pub node_index: usize,
    pub offset: usize,
}

impl CaretPosition {
    pub fn new(node_index: usize, offset: usize) -> Self {
        Self { node_index, offset }
    }
}

/// Where the caret ended up after restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    At(CaretPosition),
    EndOfContent,
}

impl Caret {
    /// Resolve to a concrete position; `EndOfContent` maps to the end of the
    /// last text node, or `None` for an empty document.
    pub fn resolve(self, doc: &Document, root: NodeId) -> Option<CaretPosition> {
        match self {
            Caret::At(position) => Some(position),
            Caret::EndOfContent => end_position(doc, root),
        }
    }
}

/// Caret state captured before a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretSnapshot {
    node: NodeId,
    offset: usize,
    absolute: usize,
}

impl CaretSnapshot {
    pub fn absolute(&self) -> usize {
        self.absolute
    }
}

/// Record the text node under `position` together with its local and
/// absolute offsets. Returns `None` when the position names no text node.
pub fn capture(doc: &Document, root: NodeId, position: CaretPosition) -> Option<CaretSnapshot> {
    let nodes = doc.text_nodes(root);
    let node = *nodes.get(position.node_index)?;
    let offset = position.offset.min(doc.text_len(node));
    let before: usize = nodes[..position.node_index]
        .iter()
        .map(|&id| doc.text_len(id))
        .sum();
    Some(CaretSnapshot {
        node,
        offset,
        absolute: before + offset,
    })
}

/// Walk the text nodes under `root` and place the caret.
///
/// The original node wins if it is still attached (offset clamped to its new
/// length); otherwise the first node whose running length reaches the
/// absolute offset is used. Anything else lands at the end of the content.
pub fn restore(doc: &Document, root: NodeId, snapshot: &CaretSnapshot) -> Caret {
    let mut accumulated = 0;
    for (index, id) in doc.text_nodes(root).into_iter().enumerate() {
        let len = doc.text_len(id);
        if id == snapshot.node {
            return Caret::At(CaretPosition::new(index, snapshot.offset.min(len)));
        }
        if accumulated + len >= snapshot.absolute {
            let local = snapshot.absolute.saturating_sub(accumulated).min(len);
            return Caret::At(CaretPosition::new(index, local));
        }
        accumulated += len;
    }
    Caret::EndOfContent
}

/// Absolute character offset of `position`, clamped to its node.
pub fn absolute_offset(doc: &Document, root: NodeId, position: CaretPosition) -> Option<usize> {
    capture(doc, root, position).map(|snapshot| snapshot.absolute)
}

/// The position at absolute character offset `absolute`, or `None` past the
/// end of the content.
pub fn position_at(doc: &Document, root: NodeId, absolute: usize) -> Option<CaretPosition> {
    let mut accumulated = 0;
    for (index, id) in doc.text_nodes(root).into_iter().enumerate() {
        let len = doc.text_len(id);
        if accumulated + len >= absolute {
            return Some(CaretPosition::new(index, absolute - accumulated));
        }
        accumulated += len;
    }
    None
}

/// The last caret position inside the content, if there is any text.
pub fn end_position(doc: &Document, root: NodeId) -> Option<CaretPosition> {
    let nodes = doc.text_nodes(root);
    let last = *nodes.last()?;
    Some(CaretPosition::new(nodes.len() - 1, doc.text_len(last)))
}
