//! Rich-text editor state.
//!
//! The host owns rendering and event delivery; this type owns the value, the
//! sanitized tree and the caret bookkeeping. Every edit goes through
//! sanitize-and-propagate: parse the raw markup, sanitize it in place, hand
//! the result to `on_change` only when it differs from the current value, and
//! queue a caret restoration that the host applies on its next tick via
//! [`RichTextEditor::flush`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::caret::{self, Caret, CaretPosition, CaretSnapshot};
use super::dom::{escape_text, parse_fragment, Document, NodeId};
use super::sanitize::sanitize_document;

pub const DEFAULT_PLACEHOLDER: &str = "Enter text...";
pub const DEFAULT_MIN_HEIGHT: &str = "120px";

const FORMATTING_TAGS: [&str; 5] = ["b", "strong", "i", "em", "u"];

pub type ChangeHandler = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    BulletList,
    NumberedList,
    ClearFormatting,
}

impl ToolbarCommand {
    /// Tags that count as "this command is active" for the toolbar state.
    fn matching_tags(self) -> &'static [&'static str] {
        match self {
            ToolbarCommand::Bold => &["b", "strong"],
            ToolbarCommand::Italic => &["i", "em"],
            ToolbarCommand::Underline => &["u"],
            ToolbarCommand::BulletList => &["ul"],
            ToolbarCommand::NumberedList => &["ol"],
            ToolbarCommand::ClearFormatting => &[],
        }
    }
}

/// A selection between two caret positions, in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Selection {
    pub anchor: CaretPosition,
    pub focus: CaretPosition,
}

impl Selection {
    pub fn collapsed(at: CaretPosition) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn new(anchor: CaretPosition, focus: CaretPosition) -> Self {
        Self { anchor, focus }
    }
}

pub struct RichTextEditor {
    value: String,
    placeholder: String,
    min_height: String,
    focused: bool,
    document: Document,
    caret: Option<Caret>,
    pending_restore: Option<CaretSnapshot>,
    on_change: ChangeHandler,
}

impl RichTextEditor {
    pub fn new(value: &str, on_change: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            value: value.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            min_height: DEFAULT_MIN_HEIGHT.to_string(),
            focused: false,
            document: parse_fragment(value),
            caret: None,
            pending_restore: None,
            on_change: Box::new(on_change),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_min_height(mut self, min_height: impl Into<String>) -> Self {
        self.min_height = min_height.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn min_height(&self) -> &str {
        &self.min_height
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Markup currently held by the editing surface.
    pub fn surface_html(&self) -> String {
        self.document.inner_html(self.document.root())
    }

    /// Caret placed by the last [`flush`](Self::flush), or the caller's own
    /// caret after an edit that left the value unchanged.
    pub fn caret(&self) -> Option<Caret> {
        self.caret
    }

    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    /// What the surface should show: the value, or the placeholder when the
    /// field is empty and unfocused. The placeholder never becomes the value.
    pub fn display_html(&self) -> String {
        if !self.value.is_empty() {
            return self.value.clone();
        }
        if self.focused {
            return String::new();
        }
        format!(
            r#"<span class="placeholder">{}</span>"#,
            escape_text(&self.placeholder)
        )
    }

    /// Parent-driven value update. While focused the surface is left alone so
    /// live edits are not clobbered.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        if self.surface_html() == value {
            return;
        }
        if self.focused {
            log::debug!("editor focused, deferring surface update");
            return;
        }
        self.document = parse_fragment(value);
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Leaving the field re-syncs the value from the surface.
    pub fn blur(&mut self) {
        self.focused = false;
        let root = self.document.root();
        sanitize_document(&mut self.document, root);
        let sanitized = self.document.inner_html(root);
        self.propagate(sanitized, None);
    }

    /// Handle raw markup from the editing surface after a keystroke or paste.
    /// Returns true when the value changed.
    pub fn handle_input(&mut self, raw: &str, caret_at: Option<CaretPosition>) -> bool {
        let mut document = parse_fragment(raw);
        let root = document.root();
        let snapshot = caret_at.and_then(|position| caret::capture(&document, root, position));
        sanitize_document(&mut document, root);
        let sanitized = document.inner_html(root);
        self.document = document;
        self.propagate(sanitized, snapshot)
    }

    /// Apply a toolbar command to `selection`, then sanitize and propagate.
    pub fn execute(&mut self, command: ToolbarCommand, selection: Selection) -> bool {
        self.focused = true;
        let root = self.document.root();
        let caret_after = match command {
            ToolbarCommand::Bold => wrap_inline(&mut self.document, root, selection, "b"),
            ToolbarCommand::Italic => wrap_inline(&mut self.document, root, selection, "i"),
            ToolbarCommand::Underline => wrap_inline(&mut self.document, root, selection, "u"),
            ToolbarCommand::BulletList => toggle_list(&mut self.document, root, selection, "ul"),
            ToolbarCommand::NumberedList => {
                toggle_list(&mut self.document, root, selection, "ol")
            }
            ToolbarCommand::ClearFormatting => {
                clear_formatting(&mut self.document, root, selection)
            }
        };
        let snapshot = caret_after.and_then(|p| caret::capture(&self.document, root, p));
        sanitize_document(&mut self.document, root);
        let sanitized = self.document.inner_html(root);
        self.propagate(sanitized, snapshot)
    }

    /// Whether the caret's text node sits inside markup for `command`.
    pub fn is_command_active(&self, command: ToolbarCommand, at: CaretPosition) -> bool {
        let root = self.document.root();
        let Some(&node) = self.document.text_nodes(root).get(at.node_index) else {
            return false;
        };
        let tags = command.matching_tags();
        self.document
            .ancestors_until(node, root)
            .into_iter()
            .any(|id| self.document.tag(id).is_some_and(|t| tags.contains(&t)))
    }

    /// Run the queued caret restoration. Never fails: anything that cannot be
    /// anchored lands at the end of the content.
    pub fn flush(&mut self) -> Option<Caret> {
        let snapshot = self.pending_restore.take()?;
        let root = self.document.root();
        let restored = caret::restore(&self.document, root, &snapshot);
        self.caret = Some(restored);
        Some(restored)
    }

    /// Concrete position for `caret` against the current surface.
    pub fn resolve_caret(&self, caret: Caret) -> Option<CaretPosition> {
        caret.resolve(&self.document, self.document.root())
    }

    fn propagate(&mut self, sanitized: String, snapshot: Option<CaretSnapshot>) -> bool {
        if sanitized == self.value {
            // Nothing to restore; the caret stays where the host put it,
            // re-anchored against the sanitized surface.
            if let Some(snapshot) = snapshot {
                let root = self.document.root();
                self.caret = Some(caret::restore(&self.document, root, &snapshot));
            }
            return false;
        }
        self.value = sanitized;
        (self.on_change)(&self.value);
        self.pending_restore = snapshot;
        true
    }
}

/// Ordered absolute range of a selection, or `None` if either end is invalid.
fn selection_range(doc: &Document, root: NodeId, selection: Selection) -> Option<(usize, usize)> {
    let a = caret::absolute_offset(doc, root, selection.anchor)?;
    let b = caret::absolute_offset(doc, root, selection.focus)?;
    Some((a.min(b), a.max(b)))
}

/// Text nodes overlapping `[start, end)`, split so each returned node lies
/// entirely inside the range.
fn isolate_range(doc: &mut Document, root: NodeId, start: usize, end: usize) -> Vec<NodeId> {
    let mut isolated = Vec::new();
    let mut accumulated = 0;
    for id in doc.text_nodes(root) {
        let len = doc.text_len(id);
        let (node_start, node_end) = (accumulated, accumulated + len);
        accumulated = node_end;

        let from = start.max(node_start);
        let to = end.min(node_end);
        if from >= to {
            continue;
        }
        let mut target = id;
        if from > node_start {
            target = doc.split_text(target, from - node_start);
        }
        if to < node_end {
            doc.split_text(target, to - from);
        }
        isolated.push(target);
    }
    isolated
}

fn wrap_inline(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    tag: &str,
) -> Option<CaretPosition> {
    let (start, end) = selection_range(doc, root, selection)?;
    if start == end {
        return None;
    }
    for text in isolate_range(doc, root, start, end) {
        let wrapper = doc.create_element(tag, Vec::new());
        doc.replace(text, wrapper);
        doc.append(wrapper, text);
    }
    caret::position_at(doc, root, end)
}

fn top_level_block(doc: &Document, root: NodeId, node: NodeId) -> NodeId {
    doc.ancestors_until(node, root).last().copied().unwrap_or(node)
}

fn toggle_list(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
    list_tag: &str,
) -> Option<CaretPosition> {
    let (_, end) = selection_range(doc, root, selection)?;
    let start_node = *doc.text_nodes(root).get(selection.anchor.node_index)?;
    let block = top_level_block(doc, root, start_node);

    let current = doc.tag(block).map(str::to_string);
    match current.as_deref() {
        Some(tag) if tag == list_tag => {
            for item in doc.children(block).to_vec() {
                let line = doc.create_element("div", Vec::new());
                doc.move_children(item, line);
                doc.insert_before(root, line, block);
            }
            doc.detach(block);
        }
        Some("ul") | Some("ol") => doc.rename(block, list_tag),
        tag => {
            let is_container = matches!(tag, Some("p") | Some("div"));
            let list = doc.create_element(list_tag, Vec::new());
            let item = doc.create_element("li", Vec::new());
            doc.replace(block, list);
            doc.append(list, item);
            if is_container {
                doc.move_children(block, item);
            } else {
                doc.append(item, block);
            }
        }
    }

    caret::position_at(doc, root, end)
}

fn clear_formatting(
    doc: &mut Document,
    root: NodeId,
    selection: Selection,
) -> Option<CaretPosition> {
    let (start, end) = selection_range(doc, root, selection)?;
    if start == end {
        return None;
    }
    let mut wrappers: Vec<NodeId> = Vec::new();
    for text in isolate_range(doc, root, start, end) {
        for ancestor in doc.ancestors_until(text, root) {
            let formatting = doc
                .tag(ancestor)
                .is_some_and(|t| FORMATTING_TAGS.contains(&t));
            if formatting && !wrappers.contains(&ancestor) {
                wrappers.push(ancestor);
            }
        }
    }
    for wrapper in wrappers {
        doc.unwrap(wrapper);
    }
    caret::position_at(doc, root, end)
}
