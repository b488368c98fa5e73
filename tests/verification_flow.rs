use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use carteiras::api::{self, middleware::state::AppState};
use carteiras::config::Config;
use carteiras::db::{MemoryStore, Store};
use carteiras::services::card_issuer::CardIssuer;

const TOKEN: &str = "operator-test-token";

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        base_url: "http://localhost:8080".to_string(),
        host: "127.0.0.1".to_string(),
        port: 8080,
        operator_token: Secret::new(TOKEN.to_string()),
    }
}

fn test_app() -> Router {
    api::app(AppState::new(Arc::new(MemoryStore::new()), test_config()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, request).await;
    (status, String::from_utf8(bytes).unwrap())
}

/// Creates company + training, returns the training id
async fn seed_training(app: &Router) -> String {
    let (status, company) = send_json(
        app,
        "POST",
        "/companies",
        json!({ "name": "Netcom Treinamentos" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, training) = send_json(
        app,
        "POST",
        "/trainings",
        json!({
            "company_id": company["id"],
            "name": "Reciclagem de Plataforma Elevatória",
            "training_date": "2025-03-10",
            "coordinator_name": "Coordenadora Pedagógica",
            "instructor_name": "Instrutor Responsável"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(training["validity_date"], "2027-03-10");
    assert_eq!(training["workload_hours"], 8.0);

    training["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_enroll_then_verify_publicly() {
    let app = test_app();
    let training_id = seed_training(&app).await;

    let (status, card) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "maria souza" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(card["student_name"], "MARIA SOUZA");

    let code = card["verification_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 32);
    assert_eq!(
        card["verification_url"],
        format!("http://localhost:8080/carteira/verificar/{}", code)
    );

    let (status, page) = get_page(&app, &format!("/carteira/verificar/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Carteira válida"));
    assert!(page.contains("MARIA SOUZA"));
    assert!(page.contains("Reciclagem de Plataforma Elevatória"));
    assert!(page.contains("Netcom Treinamentos"));
    assert!(page.contains("10/03/2027"));

    let (status, page) = get_page(&app, "/carteira/verificar/DOES-NOT-EXIST").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Carteira não encontrada"));
    assert!(page.contains("DOES-NOT-EXIST"));
}

#[tokio::test]
async fn test_invalid_page_escapes_echoed_code() {
    let app = test_app();

    let (status, page) =
        get_page(&app, "/carteira/verificar/%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!page.contains("<script>"));
    assert!(page.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_undecodable_code_renders_invalid_page() {
    let app = test_app();

    for uri in [
        "/carteira/verificar/%FF%FE",
        "/carteira/verificar/%00abc",
        "/carteira/verificar/%C3%28",
    ] {
        let (status, page) = get_page(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(page.contains("Carteira não encontrada"), "{}", uri);
    }

    let (_, page) = get_page(&app, "/carteira/verificar/%FF%FE").await;
    assert!(page.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_verification_needs_no_token_but_operator_routes_do() {
    let app = test_app();

    let (status, _) = get_page(&app, "/carteira/verificar/ABC").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_page(&app, "/trainings").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/trainings")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rename_keeps_code_and_delete_invalidates() {
    let app = test_app();
    let training_id = seed_training(&app).await;

    let (_, card) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "joão silva" }),
    )
    .await;
    let card_id = card["id"].as_str().unwrap().to_string();
    let code = card["verification_code"].as_str().unwrap().to_string();

    let (status, renamed) = send_json(
        &app,
        "PATCH",
        &format!("/cards/{}", card_id),
        json!({ "student_name": " joão da silva " }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["student_name"], "JOÃO DA SILVA");
    assert_eq!(renamed["verification_code"], code.as_str());

    let (status, detail) = send_json(&app, "GET", &format!("/trainings/{}", training_id), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["student_count"], 1);

    let (status, _) = send_json(&app, "DELETE", &format!("/trainings/{}", training_id), Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, page) = get_page(&app, &format!("/carteira/verificar/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Carteira não encontrada"));

    let (status, _) = send_json(&app, "GET", &format!("/cards/{}", card_id), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrollment_validation_errors() {
    let app = test_app();
    let training_id = seed_training(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "student_name is required");

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", uuid::Uuid::new_v4()),
        json!({ "student_name": "maria" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let code = "ABCDEF0123456789ABCDEF0123456789";
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "maria", "verification_code": code }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "joana", "verification_code": code }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_card_qr_png() {
    let app = test_app();
    let training_id = seed_training(&app).await;
    let (_, card) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "maria" }),
    )
    .await;

    let request = Request::builder()
        .uri(format!("/cards/{}/qr", card["id"].as_str().unwrap()))
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let (status, detail) = send_json(
        &app,
        "GET",
        &format!("/cards/{}", card["id"].as_str().unwrap()),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail["qr_code"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_health() {
    let app = test_app();

    let (status, body) = get_page(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_training_edit_keeps_issued_codes() {
    let app = test_app();
    let training_id = seed_training(&app).await;

    let (_, card) = send_json(
        &app,
        "POST",
        &format!("/trainings/{}/cards", training_id),
        json!({ "student_name": "maria souza" }),
    )
    .await;
    let code = card["verification_code"].as_str().unwrap().to_string();

    let (status, training) = send_json(
        &app,
        "PATCH",
        &format!("/trainings/{}", training_id),
        json!({ "training_date": "2025-04-01", "instructor_name": "Instrutora Substituta" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(training["training_date"], "2025-04-01");
    assert_eq!(training["validity_date"], "2027-04-01");
    assert_eq!(training["instructor_name"], "Instrutora Substituta");

    let (status, page) = get_page(&app, &format!("/carteira/verificar/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Carteira válida"));
    assert!(page.contains("Instrutora Substituta"));
    assert!(page.contains("01/04/2027"));

    let (status, _) = send_json(
        &app,
        "PATCH",
        &format!("/trainings/{}", training_id),
        json!({ "validity_date": "2020-01-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "PATCH",
        &format!("/trainings/{}", uuid::Uuid::new_v4()),
        json!({ "name": "Outro" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exhausted_code_space_is_503() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut state = AppState::new(store.clone(), test_config());
    state.issuer = CardIssuer::with_code_generator(
        store,
        Arc::new(|| "0123456789ABCDEF0123456789ABCDEF".to_string()),
    );
    let app = api::app(state);
    let training_id = seed_training(&app).await;
    let enroll_uri = format!("/trainings/{}/cards", training_id);

    let (status, _) = send_json(&app, "POST", &enroll_uri, json!({ "student_name": "maria" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, "POST", &enroll_uri, json!({ "student_name": "joana" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("5 attempts"));
}
