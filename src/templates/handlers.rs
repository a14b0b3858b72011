use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::model::{FormData, Language, TemplateDescriptor, TemplateSummary};
use super::render::render_preview;
use super::title::document_title;
use super::validation::{missing_required_fields, validate_form, ValidationErrors};
use crate::auth::authenticate;
use crate::documents::{NewDocument, TemplateStats};
use crate::pdf::{export_filename, ExportJob, Orientation, PaperSize};
use crate::{AppState, ErrorResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateQuery {
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    /// Category name; "All" or absent matches every category.
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub language: Language,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub form_data: FormData,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreviewResponse {
    pub html: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExportRequest {
    pub language: Language,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub form_data: FormData,
    /// Custom document title used when a draft is saved.
    pub title: Option<String>,
    /// Already-saved document; when absent a draft is saved first.
    pub document_id: Option<Uuid>,
    pub format: Option<PaperSize>,
    pub orientation: Option<Orientation>,
    pub scale: Option<f32>,
}

fn template_not_found(id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(&format!("Template '{}' not found", id)))
}

fn validation_failed(template: &TemplateDescriptor, form: &FormData) -> Option<HttpResponse> {
    let missing = missing_required_fields(template, form);
    if !missing.is_empty() {
        let message = format!("Please fill in the following fields: {}", missing.join(", "));
        return Some(
            HttpResponse::UnprocessableEntity()
                .json(ErrorResponse::unprocessable(&message, missing)),
        );
    }
    validate_form(template, form).err().map(|errors: ValidationErrors| {
        let details = errors.errors().iter().map(|e| e.message.clone()).collect();
        HttpResponse::UnprocessableEntity()
            .json(ErrorResponse::unprocessable("Some fields have invalid values", details))
    })
}

#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    params(TemplateQuery),
    responses(
        (status = 200, description = "Matching templates, most used first", body = TemplateListResponse)
    )
)]
pub async fn list_templates(
    state: web::Data<AppState>,
    query: web::Query<TemplateQuery>,
) -> impl Responder {
    let stats = state.documents.template_stats().await;
    let templates = state
        .templates
        .search(query.search.as_deref(), query.category.as_deref(), &stats)
        .into_iter()
        .map(TemplateSummary::from)
        .collect();

    HttpResponse::Ok().json(TemplateListResponse {
        templates,
        categories: state.templates.categories(),
    })
}

#[utoipa::path(
    get,
    path = "/api/templates/stats",
    tag = "Templates",
    responses(
        (status = 200, description = "Usage count per template id", body = BTreeMap<String, i64>)
    )
)]
pub async fn get_template_stats(state: web::Data<AppState>) -> impl Responder {
    let stats: TemplateStats = state.documents.template_stats().await;
    HttpResponse::Ok().json(stats)
}

#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template descriptor", body = TemplateDescriptor),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.templates.get(&id) {
        Some(template) => HttpResponse::Ok().json(template),
        None => template_not_found(&id),
    }
}

#[utoipa::path(
    post,
    path = "/api/templates/{id}/usage",
    tag = "Templates",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    responses(
        (status = 204, description = "Usage recorded (best effort)"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn track_template_usage(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let id = path.into_inner();
    if state.templates.get(&id).is_none() {
        return template_not_found(&id);
    }

    state.documents.track_usage(user.id, &id).await;
    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    post,
    path = "/api/templates/{id}/preview",
    tag = "Templates",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Rendered preview markup", body = PreviewResponse),
        (status = 400, description = "Language not supported by the template", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn preview_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PreviewRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(template) = state.templates.get(&id) else {
        return template_not_found(&id);
    };

    match render_preview(template, body.language, &body.form_data) {
        Ok(html) => HttpResponse::Ok().json(PreviewResponse { html }),
        Err(e) => HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/templates/{id}/export",
    tag = "Templates",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    request_body = ExportRequest,
    responses(
        (status = 200, description = "PDF download (application/pdf attachment)"),
        (status = 400, description = "Unsupported language or invalid scale", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 409, description = "An export is already running for this user", body = ErrorResponse),
        (status = 422, description = "Required fields missing", body = ErrorResponse),
        (status = 500, description = "PDF generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ExportRequest>,
) -> impl Responder {
    let user = match authenticate(&req, state.jwt_secret()) {
        Ok(user) => user,
        Err(e) => return e.error_response(),
    };

    let id = path.into_inner();
    let Some(template) = state.templates.get(&id) else {
        return template_not_found(&id);
    };
    let body = body.into_inner();

    if let Some(response) = validation_failed(template, &body.form_data) {
        log::info!("Export of {} rejected: incomplete form", template.id);
        return response;
    }

    let html = match render_preview(template, body.language, &body.form_data) {
        Ok(html) => html,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string())),
    };

    let job = ExportJob::new(export_filename(&template.title, body.language))
        .with_format(
            body.format.unwrap_or_default(),
            body.orientation.unwrap_or_default(),
        )
        .with_scale(body.scale.unwrap_or(state.config.default_scale));
    if let Err(e) = job.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()));
    }

    let user_key = user.id.to_string();
    let Some(_permit) = state.export_guard.try_acquire(&user_key) else {
        return HttpResponse::Conflict().json(ErrorResponse::conflict(
            "A PDF export is already in progress. Please wait for it to finish.",
        ));
    };

    let document_id = match body.document_id {
        // Only ids the caller owns are echoed back.
        Some(id) => match state.documents.get(user.id, id).await {
            Ok(Some(document)) => Some(document.id),
            Ok(None) => {
                log::warn!("Export references document {} not owned by {}", id, user.id);
                None
            }
            Err(e) => {
                log::warn!("Could not look up document {} before export: {}", id, e);
                None
            }
        },
        None => {
            let draft = NewDocument {
                template_id: template.id.clone(),
                title: document_title(body.title.as_deref(), template, &body.form_data),
                form_data: body.form_data.clone(),
                language: body.language,
            };
            // An export still goes ahead when the draft cannot be saved.
            match state.documents.save(user.id, draft).await {
                Ok(document) => Some(document.id),
                Err(e) => {
                    log::warn!("Auto-save before export failed: {}", e);
                    None
                }
            }
        }
    };

    match state.exporter.export(&html, &job).await {
        Ok(pdf) => {
            let mut response = HttpResponse::Ok();
            response
                .content_type("application/pdf")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(pdf.filename.clone())],
                })
                .insert_header(("X-Page-Count", pdf.pages.to_string()));
            if let Some(id) = document_id {
                response.insert_header(("X-Document-Id", id.to_string()));
            }
            response.body(pdf.bytes)
        }
        Err(e) => {
            log::error!("Error generating PDF for {}: {}", template.id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("ExportFailed", e.user_message()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/templates").route(web::get().to(list_templates)))
        .service(web::resource("/templates/stats").route(web::get().to(get_template_stats)))
        .service(web::resource("/templates/{id}").route(web::get().to(get_template)))
        .service(
            web::resource("/templates/{id}/usage").route(web::post().to(track_template_usage)),
        )
        .service(
            web::resource("/templates/{id}/preview").route(web::post().to(preview_template)),
        )
        .service(
            web::resource("/templates/{id}/export").route(web::post().to(export_template)),
        );
}
