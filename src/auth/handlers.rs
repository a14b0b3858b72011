use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::middleware::{authenticate, request_claims};
use super::model::User;
use super::profile::provision_profile;
use super::session::{AuthEvent, SessionManager, SessionResponse};
use super::AuthError;
use crate::{AppState, ErrorResponse};

/// Resolve the session carried by `req` the way a client resolves its
/// initial session: no token or a bad token is simply unauthenticated.
pub async fn resolve_session(req: &HttpRequest, state: &AppState) -> SessionManager {
    let manager = SessionManager::new();
    let user = match request_claims(req, state.jwt_secret()) {
        Ok(claims) => match User::from_claims(&claims) {
            Ok(user) => Some(provision_profile(state.profiles.as_ref(), user).await),
            Err(e) => {
                log::warn!("Ignoring session: {}", e);
                None
            }
        },
        Err(AuthError::MissingToken) => None,
        Err(e) => {
            log::warn!("Error getting session: {}", e);
            None
        }
    };
    manager.handle(AuthEvent::InitialSession(user));
    manager
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current session state", body = SessionResponse)
    )
)]
pub async fn get_session(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let manager = resolve_session(&req, &state).await;
    HttpResponse::Ok().json(SessionResponse::from(&manager.state()))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Provisioned profile of the signed-in user", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let user = provision_profile(state.profiles.as_ref(), user).await;
    HttpResponse::Ok().json(user)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/session").route(web::get().to(get_session)))
        .service(web::resource("/auth/me").route(web::get().to(get_me)));
}
