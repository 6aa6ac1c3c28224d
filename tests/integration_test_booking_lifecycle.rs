mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn future_slot(days_ahead: i64, hour: u32) -> DateTime<Utc> {
    (Utc::now().date_naive() + Duration::days(days_ahead))
        .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
        .and_utc()
}

/// Team, manager login, full-week schedule, and one pending booking.
async fn setup(app: &TestApp, slug: &str, hour: u32) -> (String, String, String) {
    let team = app.seed_team("Clinic", slug).await;
    app.seed_user(&team.id, &format!("mgr@{}.test", slug), "pw123456", "MANAGER").await;
    let token = app.login(&format!("mgr@{}.test", slug), "pw123456").await;

    let blocks: Vec<Value> = (0..7)
        .map(|day| json!({ "dayOfWeek": day, "startTime": "09:00", "endTime": "17:00", "active": true }))
        .collect();
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/availability")
                .header(header::COOKIE, format!("session_token={}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "blocks": blocks }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/public/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "teamSlug": slug,
                        "customerName": "Grace Hopper",
                        "customerEmail": "grace@example.com",
                        "customerPhone": "+4915100000000",
                        "startAt": future_slot(3, hour).to_rfc3339(),
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    (team.id, token, booking_id)
}

async fn post_action(app: &TestApp, token: &str, booking_id: &str, action: &str) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/bookings/{}/{}", booking_id, action))
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn staff_confirmation_attaches_a_calendar_link() {
    let app = TestApp::new().await;
    let (_, token, booking_id) = setup(&app, "confirm", 10).await;

    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "CONFIRMED");
    assert!(body["confirmed_at"].is_string());

    let (provider, event_id): (String, String) = sqlx::query_as(
        "SELECT provider, external_event_id FROM calendar_links WHERE booking_id = ?",
    )
    .bind(&booking_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(provider, "stub");
    assert_eq!(event_id, format!("stub-{}", booking_id));

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM audit_logs WHERE booking_id = ? AND action = 'booking.confirmed'",
    )
    .bind(&booking_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn confirming_twice_is_a_noop() {
    let app = TestApp::new().await;
    let (_, token, booking_id) = setup(&app, "twice", 11).await;

    post_action(&app, &token, &booking_id, "confirm").await;
    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "CONFIRMED");

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM audit_logs WHERE booking_id = ? AND action = 'booking.confirmed'",
    )
    .bind(&booking_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn cancelled_bookings_stay_cancelled() {
    let app = TestApp::new().await;
    let (_, token, booking_id) = setup(&app, "cancel", 12).await;

    let res = post_action(&app, &token, &booking_id, "cancel").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "CANCELLED");

    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["error"], "BOOKING_CANCELLED");

    // Cancelling again changes nothing.
    let res = post_action(&app, &token, &booking_id, "cancel").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn confirming_an_expired_hold_cancels_it() {
    let app = TestApp::new().await;
    let (_, token, booking_id) = setup(&app, "stale", 13).await;

    sqlx::query("UPDATE bookings SET created_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::minutes(30))
        .bind(&booking_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["error"], "BOOKING_EXPIRED");

    let (status,): (String,) = sqlx::query_as("SELECT status FROM bookings WHERE id = ?")
        .bind(&booking_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "CANCELLED");
}

#[tokio::test]
async fn member_cannot_confirm_or_cancel() {
    let app = TestApp::new().await;
    let (team_id, _, booking_id) = setup(&app, "rbac", 14).await;
    app.seed_user(&team_id, "member@rbac.test", "pw123456", "MEMBER").await;
    let token = app.login("member@rbac.test", "pw123456").await;

    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = post_action(&app, &token, &booking_id, "cancel").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bookings_are_scoped_to_the_team() {
    let app = TestApp::new().await;
    let (_, _, booking_id) = setup(&app, "teama", 15).await;

    let other = app.seed_team("Other", "teamb").await;
    app.seed_user(&other.id, "mgr@teamb.test", "pw123456", "MANAGER").await;
    let token = app.login("mgr@teamb.test", "pw123456").await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/bookings/{}", booking_id))
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = post_action(&app, &token, &booking_id, "confirm").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_supports_status_and_name_filters() {
    let app = TestApp::new().await;
    let (_, token, booking_id) = setup(&app, "filter", 9).await;

    // Second booking from a different customer, then confirm the first.
    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/public/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "teamSlug": "filter",
                        "customerName": "Katherine Johnson",
                        "customerEmail": "kj@example.com",
                        "customerPhone": "+4915100000001",
                        "startAt": future_slot(3, 11).to_rfc3339(),
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    post_action(&app, &token, &booking_id, "confirm").await;

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/bookings?status=CONFIRMED")
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = parse_body(res).await;
    let rows = body["bookings"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], booking_id.as_str());
    assert_eq!(rows[0]["customer_email"], "grace@example.com");

    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/bookings?q=Katherine")
                .header(header::COOKIE, format!("session_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = parse_body(res).await;
    let rows = body["bookings"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["customer_name"], "Katherine Johnson");
}
