//! Get-or-create of the `users` profile row for a signed-in user.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Profile, User};
use crate::db::StoreError;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn create(&self, user: &User) -> Result<Profile, StoreError>;
}

/// Resolve the stored profile of `user`, creating it on first sight.
///
/// Never fails: when the table is missing or the store errors, the
/// claim-derived user is returned as is.
pub async fn provision_profile(store: &dyn ProfileStore, user: User) -> User {
    match store.find(user.id).await {
        Ok(Some(profile)) => {
            log::debug!("User profile found for {}", user.id);
            profile.into()
        }
        Ok(None) => match store.create(&user).await {
            Ok(profile) => {
                log::info!("Created user profile for {}", user.email);
                profile.into()
            }
            Err(e) => {
                log::warn!("Could not create user profile, using token data: {}", e);
                user
            }
        },
        Err(StoreError::SetupRequired) => {
            log::warn!("Users table not ready, using token data");
            user
        }
        Err(e) => {
            log::warn!("Profile lookup failed, using token data: {}", e);
            user
        }
    }
}
