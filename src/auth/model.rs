use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::jwt::SupabaseClaims;
use super::AuthError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    #[default]
    Email,
}

impl Provider {
    /// Anything other than `google` signs in with email.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(p) if p.eq_ignore_ascii_case("google") => Provider::Google,
            _ => Provider::Email,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Email => "email",
        }
    }
}

/// Signed-in user as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub provider: Provider,
}

impl User {
    /// Display name prefers `full_name`, then `name`, then the local part of
    /// the email address.
    pub fn from_claims(claims: &SupabaseClaims) -> Result<Self, AuthError> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;
        let email = claims.email.clone().unwrap_or_default();
        let metadata = &claims.user_metadata;
        let name = [&metadata.full_name, &metadata.name]
            .into_iter()
            .flatten()
            .map(|n| n.trim())
            .find(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(Self {
            id,
            email,
            name,
            avatar: metadata.avatar_url.clone().filter(|a| !a.is_empty()),
            provider: Provider::parse(claims.app_metadata.provider.as_deref()),
        })
    }
}

/// Row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Profile> for User {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            avatar: profile.avatar_url.filter(|a| !a.is_empty()),
            provider: Provider::parse(Some(&profile.provider)),
        }
    }
}
