use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use crate::{error::ApiError, state::AppState, store::StoreError, users::model::User};

pub const CREDENTIALS_REJECTED: &str = "Could not validate credentials";

/// The authenticated caller's full stored record.
pub struct CurrentUser(pub User);

/// Why a request failed to authenticate. Only ever logged, never returned.
#[derive(Debug)]
enum AuthFailure {
    MissingHeader,
    BadScheme,
    InvalidToken,
    MissingSubject,
    UnknownUser,
    Storage(StoreError),
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthFailure> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthFailure::MissingHeader)?;
    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AuthFailure::BadScheme),
    }
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<User, AuthFailure> {
    let token = bearer_token(parts)?;
    let claims = state
        .jwt
        .decode(token)
        .map_err(|_| AuthFailure::InvalidToken)?;
    if claims.sub.trim().is_empty() {
        return Err(AuthFailure::MissingSubject);
    }
    state
        .users
        .find_by_email(&claims.sub)
        .await
        .map_err(AuthFailure::Storage)?
        .ok_or(AuthFailure::UnknownUser)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(AuthFailure::Storage(e)) => Err(e.into()),
            Err(cause) => {
                debug!(?cause, "request authentication rejected");
                Err(ApiError::unauthorized(CREDENTIALS_REJECTED))
            }
        }
    }
}
