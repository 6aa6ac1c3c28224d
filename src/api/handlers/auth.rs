use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::info;

use crate::api::dtos::requests::LoginRequest;
use crate::api::dtos::responses::{LoginResponse, UserProfile};
use crate::domain::services::auth::{self, SESSION_COOKIE, SESSION_TTL_HOURS};
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = auth::login(&state, &payload.email, &payload.password).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(Duration::hours(SESSION_TTL_HOURS));
    cookies.add(cookie);

    Ok(Json(LoginResponse {
        user: UserProfile {
            id: user.id,
            email: user.email,
            role: user.role,
            team_id: user.team_id,
        },
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let _ = auth::logout(&state, cookie.value()).await;
    }

    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").into());

    info!("User logged out");

    Ok(StatusCode::OK)
}
