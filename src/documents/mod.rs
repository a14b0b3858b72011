//! User-owned saved documents and template usage statistics.

pub mod handlers;
pub mod model;
pub mod service;
pub mod store;

pub use handlers::config;
pub use model::{CreateDocumentRequest, Document, DocumentUpdate, NewDocument};
pub use service::{DocumentService, TemplateStats};
pub use store::DocumentStore;
