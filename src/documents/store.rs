use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Document, DocumentUpdate, NewDocument};
use crate::db::StoreError;

/// Persistence for documents and template usage, always scoped by user.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, document: NewDocument) -> Result<Document, StoreError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, StoreError>;

    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// `StoreError::NotFound` when the document does not exist for this user.
    async fn update_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn record_template_usage(&self, user_id: Uuid, template_id: &str) -> Result<(), StoreError>;

    async fn template_usage_counts(&self) -> Result<BTreeMap<String, i64>, StoreError>;
}
