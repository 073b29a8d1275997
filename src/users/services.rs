use tracing::{error, info, warn};

use super::dto::{RegisterUserRequest, TokenResponse, UpdateUserRequest};
use super::model::{NewUser, User, UserChanges};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    store::{parse_object_id, StoreError},
    validation::{check_password, is_valid_email, normalize_email},
};

pub const TOKEN_TYPE: &str = "bearer";
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";
const EMAIL_TAKEN: &str = "User with this email already exists";

pub async fn register(st: &AppState, req: RegisterUserRequest) -> ApiResult<User> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    check_password(&req.password)?;

    if st.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let password_hash = st.passwords.hash_blocking(req.password).await?;
    let new_user = NewUser {
        email: email.clone(),
        password_hash,
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
    };
    let id = match st.users.insert(new_user).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            warn!(email = %email, "email registered concurrently");
            return Err(ApiError::conflict(EMAIL_TAKEN));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(user) = st.users.find_by_id(&id).await? else {
        error!(user_id = %id, "inserted user not found on re-fetch");
        return Err(anyhow::anyhow!("failed to retrieve newly created user").into());
    };
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password produce the same error after the same
/// amount of hashing work.
pub async fn authenticate(
    st: &AppState,
    email: &str,
    password: String,
) -> ApiResult<TokenResponse> {
    let email = normalize_email(email);
    let user = st.users.find_by_email(&email).await?;
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let ok = st.passwords.verify_blocking(password, stored).await?;

    let user = match user {
        Some(u) if ok => u,
        _ => {
            warn!(email = %email, "login rejected");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    let access_token = st.jwt.issue(&user.email)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}

pub async fn update_self(
    st: &AppState,
    current: &User,
    req: UpdateUserRequest,
) -> ApiResult<User> {
    let mut changes = UserChanges::from(req);
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update provided"));
    }
    if let Some(raw) = changes.org_id.take() {
        let org_id = parse_object_id(&raw)
            .ok_or_else(|| ApiError::bad_request("Invalid Organization ID"))?;
        changes.org_id = Some(org_id);
    }

    if !st.users.update_by_email(&current.email, &changes).await? {
        warn!(email = %current.email, "user vanished before update");
        return Err(ApiError::not_found("User not found for update"));
    }
    let user = st
        .users
        .find_by_email(&current.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found for update"))?;
    info!(user_id = %user.id, "user profile updated");
    Ok(user)
}

/// Previously issued tokens stay valid until they expire.
pub async fn change_password(
    st: &AppState,
    current: &User,
    new_password: String,
) -> ApiResult<()> {
    check_password(&new_password)?;
    let hash = st.passwords.hash_blocking(new_password).await?;
    if !st.users.set_password_hash(&current.email, &hash).await? {
        return Err(ApiError::not_found("User not found for update"));
    }
    info!(user_id = %current.id, "password changed");
    Ok(())
}
