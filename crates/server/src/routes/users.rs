//! User route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::Result;
use crate::models::User;
use crate::services::CreateUserRequest;
use crate::state::AppState;

/// Create a user.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.users().create(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
