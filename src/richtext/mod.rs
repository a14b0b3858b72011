//! Rich-text content: a small HTML tree, the allow-list sanitizer, caret
//! bookkeeping and the editor state machine built on top of them.

pub mod caret;
pub mod dom;
pub mod editor;
pub mod handlers;
pub mod sanitize;

pub use caret::{Caret, CaretPosition};
pub use editor::{RichTextEditor, Selection, ToolbarCommand};
pub use sanitize::{sanitize_html, ALLOWED_TAGS};
