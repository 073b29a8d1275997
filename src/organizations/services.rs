use tracing::{error, info, warn};

use super::dto::{RegisterOrganizationRequest, UpdateOrganizationRequest};
use super::model::{NewOrganization, Organization, OrganizationChanges};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    store::{parse_object_id, StoreError},
    users::model::User,
    validation::{is_valid_email, MIN_ORG_NAME_LEN},
};

/// Upper bound on a members listing; there is no cursor for the rest.
pub const MEMBERS_PAGE_SIZE: usize = 100;

const NAME_TAKEN: &str = "Organization with this name already exists";

fn parse_org_id(raw: &str) -> ApiResult<String> {
    parse_object_id(raw).ok_or_else(|| ApiError::bad_request("Invalid Organization ID"))
}

fn ensure_owner(user: &User, org_id: &str, action: &str) -> ApiResult<()> {
    if user.org_id.as_deref() != Some(org_id) {
        warn!(user_id = %user.id, %org_id, action, "organization ownership check failed");
        return Err(ApiError::forbidden(format!(
            "You do not have permission to {action} this organization."
        )));
    }
    Ok(())
}

/// Returns the trimmed name; the trimmed form is what gets stored and compared.
fn check_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.chars().count() < MIN_ORG_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Organization name must be at least {MIN_ORG_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

fn check_contact_email(email: Option<&str>) -> ApiResult<()> {
    match email {
        Some(e) if !is_valid_email(e) => Err(ApiError::bad_request("Invalid organization email")),
        _ => Ok(()),
    }
}

fn conflict_on_duplicate(e: StoreError) -> ApiError {
    match e {
        StoreError::Duplicate(_) => ApiError::conflict(NAME_TAKEN),
        other => other.into(),
    }
}

pub async fn register(
    st: &AppState,
    mut req: RegisterOrganizationRequest,
) -> ApiResult<Organization> {
    req.name = check_name(&req.name)?;
    check_contact_email(req.org_email.as_deref())?;

    if st.organizations.find_by_name(&req.name).await?.is_some() {
        warn!(name = %req.name, "organization name already registered");
        return Err(ApiError::conflict(NAME_TAKEN));
    }

    let id = st
        .organizations
        .insert(NewOrganization::from(req))
        .await
        .map_err(conflict_on_duplicate)?;
    let Some(org) = st.organizations.find_by_id(&id).await? else {
        error!(org_id = %id, "inserted organization not found on re-fetch");
        return Err(anyhow::anyhow!("failed to retrieve newly created organization").into());
    };
    info!(org_id = %org.id, name = %org.name, "organization registered");
    Ok(org)
}

pub async fn get(st: &AppState, raw_id: &str) -> ApiResult<Organization> {
    let id = parse_org_id(raw_id)?;
    st.organizations
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))
}

pub async fn update(
    st: &AppState,
    current: &User,
    raw_id: &str,
    req: UpdateOrganizationRequest,
) -> ApiResult<Organization> {
    let id = parse_org_id(raw_id)?;
    ensure_owner(current, &id, "update")?;

    let mut changes = OrganizationChanges::from(req);
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update provided"));
    }
    if let Some(name) = changes.name.take() {
        changes.name = Some(check_name(&name)?);
    }
    check_contact_email(changes.org_email.as_deref())?;

    let matched = st
        .organizations
        .update(&id, &changes)
        .await
        .map_err(conflict_on_duplicate)?;
    if !matched {
        return Err(ApiError::not_found("Organization not found"));
    }
    let org = st
        .organizations
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))?;
    info!(org_id = %org.id, user_id = %current.id, "organization updated");
    Ok(org)
}

/// Users referencing the organization, capped at [`MEMBERS_PAGE_SIZE`].
pub async fn members(st: &AppState, current: &User, raw_id: &str) -> ApiResult<Vec<User>> {
    let id = parse_org_id(raw_id)?;
    ensure_owner(current, &id, "view the members of")?;
    let members = st.users.list_by_org(&id, MEMBERS_PAGE_SIZE).await?;
    if members.len() == MEMBERS_PAGE_SIZE {
        warn!(org_id = %id, "member listing truncated at page size");
    }
    Ok(members)
}
