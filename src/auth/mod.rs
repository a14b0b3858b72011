//! Authentication against Supabase-issued access tokens.
//!
//! Sign-in itself happens at the identity provider; this module validates
//! the resulting JWTs, provisions a profile row and tracks session state.

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod model;
pub mod profile;
pub mod session;


use thiserror::Error;

pub use handlers::config;
pub use jwt::{encode_token, validate_token, SupabaseClaims, SUPABASE_AUDIENCE};
pub use middleware::{authenticate, extract_token, request_claims, validate_request_token};
pub use model::{Profile, Provider, User};
pub use profile::{provision_profile, ProfileStore};
pub use session::{
    AuthEvent, SessionManager, SessionResponse, SessionState, SessionStatus, SessionSubscription,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization token")]
    MissingToken,
    #[error("token validation is not configured")]
    NotConfigured,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject '{0}' is not a user id")]
    InvalidSubject(String),
}
