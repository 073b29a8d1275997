use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    LoginRequest, PasswordChangeRequest, RegisterUserRequest, TokenResponse, UpdateUserRequest,
};
use super::model::User;
use super::services;
use crate::{auth::CurrentUser, error::ApiResult, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_me).patch(update_me))
        .route("/me/password", patch(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = services::authenticate(&state, &payload.email, payload.password).await?;
    Ok(Json(token))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let updated = services::update_self(&state, &user, payload).await?;
    Ok(Json(updated))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    services::change_password(&state, &user, payload.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
