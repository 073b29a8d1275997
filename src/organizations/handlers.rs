use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{RegisterOrganizationRequest, UpdateOrganizationRequest};
use super::model::Organization;
use super::services;
use crate::{auth::CurrentUser, error::ApiResult, state::AppState, users::model::User};

pub fn organization_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/:org_id", get(get_organization).patch(update_organization))
        .route("/:org_id/members", get(list_members))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    let org = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

#[instrument(skip(state))]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> ApiResult<Json<Organization>> {
    Ok(Json(services::get(&state, &org_id).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_organization(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    let org = services::update(&state, &user, &org_id, payload).await?;
    Ok(Json(org))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_members(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(services::members(&state, &user, &org_id).await?))
}
