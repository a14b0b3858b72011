use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod documents;
pub mod pdf;
pub mod richtext;
pub mod templates;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    /// Per-field detail, e.g. the labels of missing required fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new("Unauthorized", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("Conflict", message)
    }

    pub fn unprocessable(message: &str, details: Vec<String>) -> Self {
        Self::new("UnprocessableEntity", message).with_details(details)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::templates::handlers::list_templates,
        crate::templates::handlers::get_template_stats,
        crate::templates::handlers::get_template,
        crate::templates::handlers::track_template_usage,
        crate::templates::handlers::preview_template,
        crate::templates::handlers::export_template,
        crate::documents::handlers::list_documents,
        crate::documents::handlers::create_document,
        crate::documents::handlers::get_document,
        crate::documents::handlers::update_document,
        crate::documents::handlers::delete_document,
        crate::richtext::handlers::sanitize,
        crate::richtext::handlers::input,
        crate::richtext::handlers::command,
        crate::auth::handlers::get_session,
        crate::auth::handlers::get_me
    ),
    components(
        schemas(
            ErrorResponse,
            templates::model::TemplateSummary,
            templates::model::TemplateDescriptor,
            templates::model::FieldSpec,
            templates::model::FieldKind,
            templates::model::Language,
            templates::handlers::TemplateListResponse,
            templates::handlers::PreviewRequest,
            templates::handlers::PreviewResponse,
            templates::handlers::ExportRequest,
            pdf::PaperSize,
            pdf::Orientation,
            documents::Document,
            documents::CreateDocumentRequest,
            documents::DocumentUpdate,
            richtext::handlers::SanitizeRequest,
            richtext::handlers::SanitizeResponse,
            richtext::handlers::EditorInputRequest,
            richtext::handlers::EditorCommandRequest,
            richtext::handlers::EditorStateResponse,
            richtext::CaretPosition,
            richtext::Selection,
            richtext::ToolbarCommand,
            auth::User,
            auth::Provider,
            auth::SessionResponse,
            auth::SessionStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Templates", description = "Template catalogue, preview and PDF export."),
        (name = "Documents", description = "Saved documents of the signed-in user."),
        (name = "Rich Text", description = "Sanitizing rich-text editing."),
        (name = "Authentication", description = "Session and profile of the bearer token.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

/// Every `/api` route; `run` mounts this under `web::scope("/api")`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(templates::handlers::config)
        .configure(documents::handlers::config)
        .configure(richtext::handlers::config)
        .configure(auth::handlers::config);
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let bind_addr = (config.host.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();

    let app_state = match AppState::connect(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to start. Please check your SUPABASE_DATABASE_URL in .env and ensure the database is running. Error: {}", e);
            std::process::exit(1);
        }
    };

    let prometheus = match PrometheusMetricsBuilder::new("lekhak_server")
        .endpoint("/metrics")
        .build()
    {
        Ok(prometheus) => prometheus,
        Err(e) => {
            log::error!("Failed to create Prometheus metrics middleware: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-document-id"),
                header::HeaderName::from_static("x-page-count"),
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(web::scope("/api").configure(configure_api))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .backlog(8192)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_addr)?
    .run()
    .await
}
