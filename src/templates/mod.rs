//! Document templates: descriptors, the built-in registry, preview rendering
//! and form validation.

pub mod handlers;
pub mod model;
pub mod registry;
pub mod render;
pub mod title;
pub mod validation;

pub use model::{FieldKind, FieldSpec, FormData, Language, LayoutBlock, Segment, TemplateDescriptor};
pub use registry::TemplateRegistry;
pub use render::render_preview;
pub use title::document_title;
pub use validation::{missing_required_fields, validate_form, ValidationErrors};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("template '{template}' does not support {language}")]
    UnsupportedLanguage { template: String, language: Language },
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
    #[error("invalid descriptor for template '{id}': {source}")]
    Descriptor {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("descriptor file for '{expected}' declares id '{found}'")]
    IdMismatch { expected: String, found: String },
}
