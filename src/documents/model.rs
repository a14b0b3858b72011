use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::templates::{FormData, Language};

/// A saved, user-owned form submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: String,
    pub title: String,
    #[schema(value_type = Object)]
    pub form_data: Json<FormData>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub template_id: String,
    pub title: String,
    pub form_data: FormData,
    pub language: Language,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub form_data: Option<FormData>,
    pub language: Option<Language>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.form_data.is_none() && self.language.is_none()
    }

    /// Apply to an existing row, bumping `updated_at`.
    pub fn apply(&self, document: &mut Document) {
        if let Some(title) = &self.title {
            document.title = title.clone();
        }
        if let Some(form_data) = &self.form_data {
            document.form_data = Json(form_data.clone());
        }
        if let Some(language) = self.language {
            document.language = language.as_str().to_string();
        }
        document.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub template_id: String,
    /// Derived from the template and form when absent.
    pub title: Option<String>,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub form_data: FormData,
    pub language: Language,
}
