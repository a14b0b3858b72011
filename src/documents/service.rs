//! Document operations with the degradation rules callers rely on: listing
//! and usage tracking never fail, deletes on a missing table are silent.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use super::model::{Document, DocumentUpdate, NewDocument};
use super::store::DocumentStore;
use crate::db::StoreError;

pub const TEMPLATE_STATS_CACHE_KEY: &str = "template_stats";
const STATS_TTL: Duration = Duration::from_secs(5 * 60);

pub type TemplateStats = BTreeMap<String, i64>;

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    stats_cache: Cache<String, TemplateStats>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let stats_cache = Cache::builder()
            .time_to_live(STATS_TTL)
            .max_capacity(1)
            .build();
        Self { store, stats_cache }
    }

    pub async fn save(&self, user_id: Uuid, document: NewDocument) -> Result<Document, StoreError> {
        let saved = self.store.insert(user_id, document).await.map_err(|e| {
            log::error!("Error saving document: {}", e);
            e
        })?;
        log::info!("Saved document {} for user {}", saved.id, user_id);
        Ok(saved)
    }

    /// Documents of `user_id`, newest first; empty when the store is unavailable.
    pub async fn list(&self, user_id: Uuid) -> Vec<Document> {
        match self.store.list_for_user(user_id).await {
            Ok(documents) => documents,
            Err(StoreError::SetupRequired) => {
                log::warn!("Documents table doesn't exist yet, returning empty list");
                Vec::new()
            }
            Err(e) => {
                log::error!("Error listing documents for {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.store.get_for_user(user_id, id).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError> {
        self.store
            .update_for_user(user_id, id, update)
            .await
            .map_err(|e| {
                if !matches!(e, StoreError::NotFound) {
                    log::error!("Error updating document {}: {}", id, e);
                }
                e
            })
    }

    /// Returns whether anything was removed. A missing table counts as
    /// nothing to remove.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        match self.store.delete_for_user(user_id, id).await {
            Err(StoreError::SetupRequired) => {
                log::warn!("Documents table doesn't exist yet, nothing to delete");
                Ok(false)
            }
            other => other,
        }
    }

    /// Best effort; failures are logged and swallowed.
    pub async fn track_usage(&self, user_id: Uuid, template_id: &str) {
        match self.store.record_template_usage(user_id, template_id).await {
            Ok(()) => {
                self.stats_cache.invalidate(TEMPLATE_STATS_CACHE_KEY).await;
                log::debug!("Recorded usage of {} by {}", template_id, user_id);
            }
            Err(e) => log::warn!("Template usage tracking failed: {}", e),
        }
    }

    /// Usage counts per template id, cached for a few minutes. Empty when
    /// the store is unavailable; failures are not cached.
    pub async fn template_stats(&self) -> TemplateStats {
        if let Some(stats) = self.stats_cache.get(TEMPLATE_STATS_CACHE_KEY).await {
            log::debug!("Template stats cache HIT");
            return stats;
        }
        log::debug!("Template stats cache MISS");

        match self.store.template_usage_counts().await {
            Ok(stats) => {
                self.stats_cache
                    .insert(TEMPLATE_STATS_CACHE_KEY.to_string(), stats.clone())
                    .await;
                stats
            }
            Err(e) => {
                log::warn!("Template stats not available: {}", e);
                TemplateStats::new()
            }
        }
    }
}
