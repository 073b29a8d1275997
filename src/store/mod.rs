//! Document storage boundary.
//!
//! Handlers only see the [`UserStore`] and [`OrganizationStore`] traits; the
//! Postgres implementation backs production and the in-memory one backs
//! tests and local runs.

use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

use crate::organizations::model::{NewOrganization, Organization, OrganizationChanges};
use crate::users::model::{NewUser, User, UserChanges};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    /// Inserts a new user and returns the generated id. Fails with
    /// [`StoreError::Duplicate`] when the email is taken.
    async fn insert(&self, user: NewUser) -> StoreResult<String>;
    /// Applies `changes` to the user with `email`; `false` when nothing matched.
    async fn update_by_email(&self, email: &str, changes: &UserChanges) -> StoreResult<bool>;
    async fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<bool>;
    /// Users whose organization reference equals `org_id`, at most `limit`.
    async fn list_by_org(&self, org_id: &str, limit: usize) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Organization>>;
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Organization>>;
    /// Fails with [`StoreError::Duplicate`] when the name is taken.
    async fn insert(&self, org: NewOrganization) -> StoreResult<String>;
    async fn update(&self, id: &str, changes: &OrganizationChanges) -> StoreResult<bool>;
}

/// Fresh store-assigned identifier, 24 lowercase hex characters.
pub fn new_object_id() -> String {
    ObjectId::new().to_hex()
}

/// Parses an externally supplied identifier into canonical lowercase form.
pub fn parse_object_id(raw: &str) -> Option<String> {
    ObjectId::parse_str(raw).ok().map(|oid| oid.to_hex())
}
