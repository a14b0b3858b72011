mod common;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{bearer, context, token_for};
use lekhak_server::configure_api;
use lekhak_server::templates::handlers::{PreviewResponse, TemplateListResponse};

#[actix_web::test]
async fn test_list_templates() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let body: TemplateListResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.templates.len(), 8);
    assert_eq!(body.templates[0].id, "leave-application");
    assert!(body.categories.contains(&"Legal".to_string()));
}

#[actix_web::test]
async fn test_list_templates_filters_by_category_and_search() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/templates?category=Legal&search=rent")
        .to_request();
    let body: TemplateListResponse = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<_> = body.templates.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["rent-agreement"]);
}

#[actix_web::test]
async fn test_get_template_and_not_found() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/templates/rti-application")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], "rti-application");
    assert!(body["fields"].as_array().unwrap().len() >= 10);

    let req = test::TestRequest::get()
        .uri("/api/templates/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_preview_escapes_text_and_sanitizes_rich_text() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/templates/leave-application/preview")
        .set_json(json!({
            "language": "english",
            "form_data": {
                "applicantName": "<b>Ram</b>",
                "leaveReason": "<p onclick=\"x()\">Sick<script>alert(1)</script></p>"
            }
        }))
        .to_request();
    let body: PreviewResponse = test::call_and_read_body_json(&app, req).await;

    assert!(body.html.starts_with("<div class=\"document-preview\""));
    assert!(body.html.contains("&lt;b&gt;Ram&lt;/b&gt;"));
    assert!(body.html.contains("<p>Sick</p>"));
    assert!(!body.html.contains("script"));
    assert!(!body.html.contains("onclick"));
    // Unfilled fields fall back to their placeholders.
    assert!(body.html.contains("Your Position"));
}

#[actix_web::test]
async fn test_preview_rejects_unsupported_language() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/templates/marriage-affidavit/preview")
        .set_json(json!({ "language": "nepali", "form_data": {} }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_usage_tracking_updates_stats() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/templates/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats, json!({}));

    let token = token_for(Uuid::new_v4(), "sita@example.com", None);
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/templates/cv-resume/usage")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 204);
    }

    let req = test::TestRequest::get().uri("/api/templates/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats, json!({ "cv-resume": 2 }));

    // Most used template now leads the listing.
    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let body: TemplateListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.templates[0].id, "cv-resume");
}

#[actix_web::test]
async fn test_usage_tracking_requires_auth() {
    let ctx = context();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/templates/cv-resume/usage")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert!(ctx.documents.usage.lock().is_empty());
}
