use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::caret::CaretPosition;
use super::editor::{RichTextEditor, Selection, ToolbarCommand};
use super::sanitize::sanitize_html;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SanitizeRequest {
    pub html: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SanitizeResponse {
    pub html: String,
}

/// One keystroke or paste delivered by an editing surface.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EditorInputRequest {
    #[serde(default)]
    pub previous_value: String,
    pub html: String,
    pub caret: Option<CaretPosition>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditorCommandRequest {
    #[serde(default)]
    pub value: String,
    pub command: ToolbarCommand,
    pub selection: Selection,
}

/// Result of an edit. `caret` is where the surface should put the caret:
/// the restored position after a change, the supplied caret (clamped) when
/// nothing changed, or the end of the content. It is `None` only when no
/// caret was supplied or the content has no text.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EditorStateResponse {
    pub value: String,
    pub changed: bool,
    pub caret: Option<CaretPosition>,
}

fn editor_state(editor: &mut RichTextEditor, changed: bool) -> EditorStateResponse {
    let caret = editor
        .flush()
        .or_else(|| editor.caret())
        .and_then(|restored| editor.resolve_caret(restored));
    EditorStateResponse {
        value: editor.value().to_string(),
        changed,
        caret,
    }
}

#[utoipa::path(
    post,
    path = "/api/richtext/sanitize",
    tag = "Rich Text",
    request_body = SanitizeRequest,
    responses(
        (status = 200, description = "Sanitized markup", body = SanitizeResponse)
    )
)]
pub async fn sanitize(body: web::Json<SanitizeRequest>) -> impl Responder {
    HttpResponse::Ok().json(SanitizeResponse {
        html: sanitize_html(&body.html),
    })
}

#[utoipa::path(
    post,
    path = "/api/richtext/input",
    tag = "Rich Text",
    request_body = EditorInputRequest,
    responses(
        (status = 200, description = "Sanitized value and restored caret", body = EditorStateResponse)
    )
)]
pub async fn input(body: web::Json<EditorInputRequest>) -> impl Responder {
    let body = body.into_inner();
    let mut editor = RichTextEditor::new(&body.previous_value, |_: &str| {});
    editor.focus();
    let changed = editor.handle_input(&body.html, body.caret);
    HttpResponse::Ok().json(editor_state(&mut editor, changed))
}

#[utoipa::path(
    post,
    path = "/api/richtext/command",
    tag = "Rich Text",
    request_body = EditorCommandRequest,
    responses(
        (status = 200, description = "Value after the toolbar command", body = EditorStateResponse)
    )
)]
pub async fn command(body: web::Json<EditorCommandRequest>) -> impl Responder {
    let body = body.into_inner();
    let mut editor = RichTextEditor::new(&body.value, |_: &str| {});
    let changed = editor.execute(body.command, body.selection);
    log::debug!("toolbar command {:?} changed={}", body.command, changed);
    HttpResponse::Ok().json(editor_state(&mut editor, changed))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/richtext/sanitize").route(web::post().to(sanitize)))
        .service(web::resource("/richtext/input").route(web::post().to(input)))
        .service(web::resource("/richtext/command").route(web::post().to(command)));
}
