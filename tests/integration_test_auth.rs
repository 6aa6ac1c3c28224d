mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    let team = app.seed_team("Clinic", "clinic-auth").await;
    app.seed_user(&team.id, "staff@example.com", "correct-horse", "ADMIN").await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "staff@example.com", "password": "wrong" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = parse_body(res).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let app = TestApp::new().await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "nobody@example.com", "password": "whatever" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_returns_profile_and_session_cookie() {
    let app = TestApp::new().await;
    let team = app.seed_team("Clinic", "clinic-login").await;
    app.seed_user(&team.id, "staff@example.com", "pw123456", "MANAGER").await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "staff@example.com", "password": "pw123456" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie missing")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = parse_body(res).await;
    assert_eq!(body["user"]["email"], "staff@example.com");
    assert_eq!(body["user"]["role"], "MANAGER");
    assert_eq!(body["user"]["teamId"], team.id);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = TestApp::new().await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/availability")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new().await;
    let team = app.seed_team("Clinic", "clinic-logout").await;
    app.seed_user(&team.id, "staff@example.com", "pw123456", "ADMIN").await;
    let token = app.login("staff@example.com", "pw123456").await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/logout")
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/availability")
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
