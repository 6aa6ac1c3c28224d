use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::api::dtos::requests::ReplaceAvailabilityRequest;
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::availability;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let blocks = availability::list_availability(&state, &user.team_id).await?;
    Ok(Json(json!({ "blocks": blocks })))
}

pub async fn replace_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ReplaceAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let blocks = availability::replace_availability(&state, &user, payload.blocks).await?;
    Ok(Json(json!({ "blocks": blocks })))
}
