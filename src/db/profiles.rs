use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::auth::{Profile, ProfileStore, User};

const PROFILE_COLUMNS: &str = "id, email, name, avatar_url, provider, created_at";

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn create(&self, user: &User) -> Result<Profile, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, avatar_url, provider) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PROFILE_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.avatar)
            .bind(user.provider.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }
}
