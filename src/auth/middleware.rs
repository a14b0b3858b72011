use actix_web::error::InternalError;
use actix_web::{Error, HttpRequest, HttpResponse};

use super::jwt::{validate_token, SupabaseClaims};
use super::model::User;
use super::AuthError;
use crate::ErrorResponse;

fn unauthorized(message: &'static str) -> Error {
    let response = HttpResponse::Unauthorized().json(ErrorResponse::unauthorized(message));
    InternalError::from_response(message, response).into()
}

/// Extract token from Authorization header
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Claims of the bearer token, or the reason there are none.
pub fn request_claims(req: &HttpRequest, secret: Option<&str>) -> Result<SupabaseClaims, AuthError> {
    let token = extract_token(req).ok_or(AuthError::MissingToken)?;
    let secret = secret.ok_or(AuthError::NotConfigured)?;
    validate_token(&token, secret)
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(
    req: &HttpRequest,
    secret: Option<&str>,
) -> Result<SupabaseClaims, Error> {
    request_claims(req, secret).map_err(|e| match e {
        AuthError::MissingToken => unauthorized("Missing authorization token"),
        other => {
            log::warn!("Token validation failed: {}", other);
            unauthorized("Invalid or expired token")
        }
    })
}

/// The claim-derived user of an authenticated request.
pub fn authenticate(req: &HttpRequest, secret: Option<&str>) -> Result<User, Error> {
    let claims = validate_request_token(req, secret)?;
    User::from_claims(&claims).map_err(|e| {
        log::warn!("Rejecting token: {}", e);
        unauthorized("Invalid or expired token")
    })
}
