//! Postgres-backed document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::documents::model::{Document, DocumentUpdate, NewDocument};
use crate::documents::store::DocumentStore;

const DOCUMENT_COLUMNS: &str =
    "id, user_id, template_id, title, form_data, language, created_at, updated_at";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, user_id: Uuid, document: NewDocument) -> Result<Document, StoreError> {
        let sql = format!(
            "INSERT INTO documents (user_id, template_id, title, form_data, language) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {DOCUMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Document>(&sql)
            .bind(user_id)
            .bind(&document.template_id)
            .bind(&document.title)
            .bind(Json(&document.form_data))
            .bind(document.language.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, Document>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError> {
        let sql = format!(
            "UPDATE documents SET \
               title = COALESCE($3, title), \
               form_data = COALESCE($4, form_data), \
               language = COALESCE($5, language), \
               updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(update.title)
            .bind(update.form_data.map(Json))
            .bind(update.language.map(|l| l.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_template_usage(&self, user_id: Uuid, template_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO template_usage (template_id, user_id) VALUES ($1, $2)")
            .bind(template_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn template_usage_counts(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT template_id, COUNT(*) FROM template_usage GROUP BY template_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
