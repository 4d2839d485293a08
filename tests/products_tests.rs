
use reqwest::{multipart::Form, StatusCode};
use serde_json::Value;
use test_utils::*;
use uuid::Uuid;

use product_catalog::entities::product::{Product, ProductStatus};

#[actix_rt::test]
async fn create_without_image_returns_201() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(Form::new().text("title", "Lamp").text("status", "active"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let product: Product = response.json().await.unwrap();
    assert_eq!(product.title, "Lamp");
    assert_eq!(product.status, ProductStatus::Active);
    assert_eq!(product.image, None);
    assert_eq!(app.product_count().await, 1);
}

#[actix_rt::test]
async fn create_with_png_stores_and_serves_the_image() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("title", "Lamp")
        .text("status", "active")
        .part("image", image_part("lamp.png", png_bytes(500 * 1024), "image/png"));
    let response = app.post_form(form).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let product: Product = response.json().await.unwrap();
    let image = product.image.expect("image reference");
    assert!(image.starts_with("/uploads/"));
    assert!(image.ends_with(".png"));
    assert_eq!(app.stored_uploads().len(), 1);

    let served = app.client.get(format!("{}{}", app.address, image)).send().await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(
        served.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    let etag = served.headers().get("etag").cloned().expect("etag header");
    assert_eq!(served.bytes().await.unwrap().len(), 500 * 1024);

    let revalidated = app
        .client
        .get(format!("{}{}", app.address, image))
        .header("If-None-Match", etag)
        .send()
        .await
        .unwrap();
    assert_eq!(revalidated.status(), StatusCode::NOT_MODIFIED);
    assert!(revalidated.bytes().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn gif_upload_is_rejected_as_validation_failure() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("title", "Animated")
        .text("status", "active")
        .part("image", image_part("anim.gif", b"GIF89a".to_vec(), "image/gif"));
    let response = app.post_form(form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "image");
    assert_eq!(body["details"][0]["message"], "Only .jpg, .jpeg, .png allowed");

    assert_eq!(app.product_count().await, 0);
    assert!(app.stored_uploads().is_empty());
}

async fn post_png_of_size(app: &TestApp, size: usize) -> reqwest::Response {
    let form = Form::new()
        .text("title", "Poster")
        .text("status", "active")
        .part("image", image_part("poster.png", png_bytes(size), "image/png"));
    app.post_form(form).await
}

#[actix_rt::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn().await;

    let response = post_png_of_size(&app, 3 * 1024 * 1024).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "image");

    assert_eq!(app.product_count().await, 0);
    assert!(app.stored_uploads().is_empty());
}

#[actix_rt::test]
async fn upload_limit_is_inclusive_at_two_mebibytes() {
    let app = TestApp::spawn().await;
    let limit = 2 * 1024 * 1024;

    let response = post_png_of_size(&app, limit).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.stored_uploads().len(), 1);

    let response = post_png_of_size(&app, limit + 1).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "image");

    assert_eq!(app.product_count().await, 1);
    assert_eq!(app.stored_uploads().len(), 1);
}

#[actix_rt::test]
async fn non_multipart_create_gets_json_validation_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.products_url())
        .json(&serde_json::json!({"title": "Lamp", "status": "active"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "body");
    assert_eq!(app.product_count().await, 0);
}

#[actix_rt::test]
async fn non_multipart_update_gets_json_validation_envelope() {
    let app = TestApp::spawn().await;
    let created = app.create_product("Lamp", "active", None).await;

    let response = app
        .client
        .put(app.product_url(created.id))
        .body("title=Desk+Lamp")
        .header("content-type", "application/x-www-form-urlencoded")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
}

#[actix_rt::test]
async fn missing_title_and_bad_status_report_field_details() {
    let app = TestApp::spawn().await;

    let response = app.post_form(Form::new().text("status", "archived")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["status", "title"]);
}

#[actix_rt::test]
async fn list_filters_by_status() {
    let app = TestApp::spawn().await;
    app.create_product("Lamp", "active", None).await;
    let chair = app.create_product("Chair", "inactive", None).await;

    let response = app.list(&[("status", "inactive")]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let products: Vec<Product> = response.json().await.unwrap();
    assert_eq!(products, vec![chair]);
}

#[actix_rt::test]
async fn list_is_newest_first_and_honors_inclusive_date_range() {
    let app = TestApp::spawn().await;
    app.create_product("January", "active", Some("2024-01-05")).await;
    app.create_product("February", "active", Some("2024-02-10")).await;
    app.create_product("March", "active", Some("2024-03-20")).await;

    let all: Vec<Product> = app.list(&[]).await.json().await.unwrap();
    let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["March", "February", "January"]);

    let ranged: Vec<Product> = app
        .list(&[("startDate", "2024-02-10"), ("endDate", "2024-03-20")])
        .await
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = ranged.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["March", "February"]);
}

#[actix_rt::test]
async fn blank_filters_impose_no_constraint() {
    let app = TestApp::spawn().await;
    app.create_product("Lamp", "active", None).await;

    let products: Vec<Product> = app
        .list(&[("status", ""), ("startDate", ""), ("endDate", "")])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
}

#[actix_rt::test]
async fn unparseable_filter_date_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app.list(&[("startDate", "yesterday")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "startDate");
}

#[actix_rt::test]
async fn get_returns_the_created_record() {
    let app = TestApp::spawn().await;
    let created = app.create_product("Lamp", "active", Some("2024-04-01")).await;

    let response = app.client.get(app.product_url(created.id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fetched: Product = response.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[actix_rt::test]
async fn update_of_status_only_keeps_other_fields() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("title", "Lamp")
        .text("description", "Brass desk lamp")
        .text("status", "active")
        .text("date", "2024-04-01")
        .part("image", image_part("lamp.png", png_bytes(1024), "image/png"));
    let created: Product = app.post_form(form).await.json().await.unwrap();

    let response = app
        .put_form(created.id, Form::new().text("title", "Lamp").text("status", "inactive"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Product = response.json().await.unwrap();
    assert_eq!(updated.status, ProductStatus::Inactive);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.date, created.date);
    assert_eq!(updated.image, created.image);
}

#[actix_rt::test]
async fn update_of_missing_record_is_404_and_leaves_no_upload() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("title", "Ghost")
        .text("status", "active")
        .part("image", image_part("ghost.png", png_bytes(1024), "image/png"));
    let response = app.put_form(Uuid::new_v4(), form).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Not found"}));
    assert!(app.stored_uploads().is_empty());
}

#[actix_rt::test]
async fn delete_then_get_is_not_found() {
    let app = TestApp::spawn().await;
    let created = app.create_product("Lamp", "active", None).await;

    let response = app.client.delete(app.product_url(created.id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Deleted");

    let response = app.client.get(app.product_url(created.id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_of_nonexistent_record_returns_not_found_envelope() {
    let app = TestApp::spawn().await;

    let response = app.client.delete(app.product_url(Uuid::new_v4())).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Not found"}));
}

#[actix_rt::test]
async fn malformed_id_is_a_storage_error() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.product_url("not-a-uuid")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
}

#[actix_rt::test]
async fn unknown_upload_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/uploads/1700000000000-1.png", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn health_reports_store_connectivity() {
    let app = TestApp::spawn().await;

    let response = app.client.get(format!("{}/health", app.address)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "OK");
}

#[actix_rt::test]
async fn cors_allows_the_configured_client_with_credentials() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.products_url())
        .header("Origin", CLIENT_ORIGIN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some(CLIENT_ORIGIN)
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[actix_rt::test]
async fn cors_preflight_allows_content_type_but_not_authorization() {
    let app = TestApp::spawn().await;

    let preflight = |request_headers: &'static str| {
        app.client
            .request(reqwest::Method::OPTIONS, app.products_url())
            .header("Origin", CLIENT_ORIGIN)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", request_headers)
            .send()
    };

    let allowed = preflight("content-type").await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some(CLIENT_ORIGIN)
    );

    let refused = preflight("authorization").await.unwrap();
    assert!(!refused.status().is_success());
}
