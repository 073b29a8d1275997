use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{new_object_id, OrganizationStore, StoreError, StoreResult, UserStore};
use crate::organizations::model::{NewOrganization, Organization, OrganizationChanges};
use crate::users::model::{NewUser, User, UserChanges};

/// In-process document store. Insertion order is preserved, uniqueness of
/// user email and organization name is checked under the write lock.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    organizations: RwLock<Vec<Organization>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<String> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let id = new_object_id();
        users.push(user.into_user(id.clone()));
        Ok(id)
    }

    async fn update_by_email(&self, email: &str, changes: &UserChanges) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                changes.apply_to(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_org(&self, org_id: &str, limit: usize) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.org_id.as_deref() == Some(org_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Organization>> {
        let orgs = self.organizations.read().await;
        Ok(orgs.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Organization>> {
        let orgs = self.organizations.read().await;
        Ok(orgs.iter().find(|o| o.name == name).cloned())
    }

    async fn insert(&self, org: NewOrganization) -> StoreResult<String> {
        let mut orgs = self.organizations.write().await;
        if orgs.iter().any(|o| o.name == org.name) {
            return Err(StoreError::Duplicate("name"));
        }
        let id = new_object_id();
        orgs.push(org.into_organization(id.clone()));
        Ok(id)
    }

    async fn update(&self, id: &str, changes: &OrganizationChanges) -> StoreResult<bool> {
        let mut orgs = self.organizations.write().await;
        if let Some(name) = &changes.name {
            if orgs.iter().any(|o| &o.name == name && o.id != id) {
                return Err(StoreError::Duplicate("name"));
            }
        }
        match orgs.iter_mut().find(|o| o.id == id) {
            Some(org) => {
                changes.apply_to(org);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
