//! Account routes proxied to the user service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::context::RequestContext;
use crate::network::error::ApiError;
use crate::rpc::{SignIn, SignUp, Tokens, UpdateUser, User, UserClient};

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: u64,
}

fn client(state: &AppState) -> Result<&Arc<UserClient>, ApiError> {
    state.users.as_ref().ok_or(ApiError::NotConfigured)
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)
}

pub async fn sign_up(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<SignUp>,
) -> Result<(StatusCode, Json<UserIdResponse>), ApiError> {
    let user_id = client(&state)?.sign_up(&ctx, &dto).await?;
    Ok((StatusCode::CREATED, Json(UserIdResponse { user_id })))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<SignIn>,
) -> Result<Json<Tokens>, ApiError> {
    Ok(Json(client(&state)?.sign_in(&ctx, &dto).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(pair): Json<Tokens>,
) -> Result<Json<Tokens>, ApiError> {
    Ok(Json(client(&state)?.refresh(&ctx, &pair).await?))
}

pub async fn me(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let access = bearer_token(&headers)?;
    Ok(Json(client(&state)?.get_me(&ctx, access).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<u64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(client(&state)?.get_by_id(&ctx, user_id).await?))
}

/// Requires a valid access token before the update is forwarded.
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Json(dto): Json<UpdateUser>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let users = client(&state)?;
    users.validate(&ctx, bearer_token(&headers)?).await?;
    let user_id = users.update(&ctx, &dto).await?;
    Ok(Json(UserIdResponse { user_id }))
}
