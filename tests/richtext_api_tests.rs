mod common;

use actix_web::{test, web, App};
use serde_json::json;

use common::context;
use lekhak_server::configure_api;
use lekhak_server::richtext::handlers::{EditorStateResponse, SanitizeResponse};
use lekhak_server::richtext::CaretPosition;

#[actix_web::test]
async fn test_sanitize_endpoint() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/sanitize")
        .set_json(json!({
            "html": "<div onmouseover=\"steal()\"><a href=\"javascript:alert(1)\">link</a><script>x()</script><b>ok</b></div>"
        }))
        .to_request();
    let body: SanitizeResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.html, "<div><span>link</span><b>ok</b></div>");
}

#[actix_web::test]
async fn test_input_sanitizes_and_restores_caret() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/input")
        .set_json(json!({
            "previous_value": "ab",
            "html": "ab<font>cd</font>",
            "caret": { "node_index": 1, "offset": 1 }
        }))
        .to_request();
    let body: EditorStateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.value, "ab<span>cd</span>");
    assert!(body.changed);
    assert_eq!(body.caret, Some(CaretPosition::new(1, 1)));
}

#[actix_web::test]
async fn test_input_without_change() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/input")
        .set_json(json!({ "previous_value": "<p>same</p>", "html": "<p>same</p>" }))
        .to_request();
    let body: EditorStateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.value, "<p>same</p>");
    assert!(!body.changed);
    assert_eq!(body.caret, None);
}

#[actix_web::test]
async fn test_unchanged_input_keeps_caret() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/input")
        .set_json(json!({
            "previous_value": "<p>hello world</p>",
            "html": "<p>hello world<img src=x></p>",
            "caret": { "node_index": 0, "offset": 3 }
        }))
        .to_request();
    let body: EditorStateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.value, "<p>hello world</p>");
    assert!(!body.changed);
    assert_eq!(body.caret, Some(CaretPosition::new(0, 3)));
}

#[actix_web::test]
async fn test_toolbar_commands() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/command")
        .set_json(json!({
            "value": "<p>hello world</p>",
            "command": "bold",
            "selection": {
                "anchor": { "node_index": 0, "offset": 6 },
                "focus": { "node_index": 0, "offset": 11 }
            }
        }))
        .to_request();
    let body: EditorStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.value, "<p>hello <b>world</b></p>");
    assert!(body.changed);

    let req = test::TestRequest::post()
        .uri("/api/richtext/command")
        .set_json(json!({
            "value": "<p>item</p>",
            "command": "numbered_list",
            "selection": {
                "anchor": { "node_index": 0, "offset": 1 },
                "focus": { "node_index": 0, "offset": 1 }
            }
        }))
        .to_request();
    let body: EditorStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.value, "<ol><li>item</li></ol>");
}

#[actix_web::test]
async fn test_unknown_command_is_a_client_error() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/richtext/command")
        .set_json(json!({
            "value": "<p>x</p>",
            "command": "strikethrough",
            "selection": {
                "anchor": { "node_index": 0, "offset": 0 },
                "focus": { "node_index": 0, "offset": 1 }
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
