use actix_web::{web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;

use super::model::{CreateDocumentRequest, Document, DocumentUpdate, NewDocument};
use crate::auth::authenticate;
use crate::db::StoreError;
use crate::templates::document_title;
use crate::{AppState, ErrorResponse};

/// JSON error for a failed store call.
pub(crate) fn store_error_response(e: &StoreError, action: &str) -> HttpResponse {
    match e {
        StoreError::SetupRequired => HttpResponse::ServiceUnavailable()
            .json(ErrorResponse::new("SetupRequired", &e.to_string())),
        StoreError::NotFound => {
            HttpResponse::NotFound().json(ErrorResponse::not_found("Document not found"))
        }
        StoreError::Database(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error(&format!("Failed to {} document", action))),
    }
}

#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    responses(
        (status = 200, description = "Documents of the signed-in user, newest first", body = Vec<Document>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    HttpResponse::Ok().json(state.documents.list(user.id).await)
}

#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document saved", body = Document),
        (status = 400, description = "Unknown template or unsupported language", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 503, description = "Database setup required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateDocumentRequest>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let body = body.into_inner();
    let template = match state.templates.require(&body.template_id) {
        Ok(template) => template,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string())),
    };
    if !template.supports(body.language) {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
            "Template '{}' is not available in {}",
            template.id, body.language
        )));
    }

    let title = document_title(body.title.as_deref(), template, &body.form_data);
    let new_document = NewDocument {
        template_id: template.id.clone(),
        title,
        form_data: body.form_data,
        language: body.language,
    };

    match state.documents.save(user.id, new_document).await {
        Ok(document) => HttpResponse::Created().json(document),
        Err(e) => store_error_response(&e, "save"),
    }
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    match state.documents.get(user.id, path.into_inner()).await {
        Ok(Some(document)) => HttpResponse::Ok().json(document),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found("Document not found")),
        Err(e) => {
            log::error!("Failed to load document: {}", e);
            store_error_response(&e, "load")
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    request_body = DocumentUpdate,
    responses(
        (status = 200, description = "Document updated", body = Document),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 503, description = "Database setup required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<DocumentUpdate>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let update = body.into_inner();
    if update.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request("Nothing to update"));
    }

    match state.documents.update(user.id, path.into_inner(), update).await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => store_error_response(&e, "update"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 204, description = "Document deleted, or nothing to delete"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let id = path.into_inner();
    match state.documents.delete(user.id, id).await {
        Ok(removed) => {
            if removed {
                log::info!("Deleted document {} for user {}", id, user.id);
            }
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            log::error!("Error deleting document {}: {}", id, e);
            store_error_response(&e, "delete")
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/documents")
            .route(web::get().to(list_documents))
            .route(web::post().to(create_document)),
    )
    .service(
        web::resource("/documents/{id}")
            .route(web::get().to(get_document))
            .route(web::put().to(update_document))
            .route(web::delete().to(delete_document)),
    );
}
