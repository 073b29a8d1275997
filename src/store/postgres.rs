use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{new_object_id, OrganizationStore, StoreError, StoreResult, UserStore};
use crate::organizations::model::{NewOrganization, Organization, OrganizationChanges};
use crate::users::model::{
    Education, Experience, NewUser, Profile, Project, Skill, User, UserChanges, DEFAULT_ROLE,
};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, phone_number, role,
    is_active, is_deleted, org_id, profile, education, experience, projects, skills
"#;

const ORG_COLUMNS: &str =
    "id, name, industry, description, location, org_email, org_phone_number";

/// Postgres-backed document store. Nested user documents live in JSONB columns.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    role: String,
    is_active: bool,
    is_deleted: bool,
    org_id: Option<String>,
    profile: Option<Json<Profile>>,
    education: Option<Json<Vec<Education>>>,
    experience: Option<Json<Vec<Experience>>>,
    projects: Option<Json<Vec<Project>>>,
    skills: Option<Json<Vec<Skill>>>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            phone_number: r.phone_number,
            role: r.role,
            is_active: r.is_active,
            is_deleted: r.is_deleted,
            org_id: r.org_id,
            profile: r.profile.map(|j| j.0),
            education: r.education.map(|j| j.0),
            experience: r.experience.map(|j| j.0),
            projects: r.projects.map(|j| j.0),
            skills: r.skills.map(|j| j.0),
        }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    industry: Option<String>,
    description: Option<String>,
    location: Option<String>,
    org_email: Option<String>,
    org_phone_number: Option<String>,
}

impl From<OrganizationRow> for Organization {
    fn from(r: OrganizationRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            industry: r.industry,
            description: r.description,
            location: r.location,
            org_email: r.org_email,
            org_phone_number: r.org_phone_number,
        }
    }
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    /// Creates tables and the unique indexes on user email and organization name.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        info!("database schema and indexes are up to date");
        Ok(())
    }

    async fn find_user(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("find user by {column}"))?;
        Ok(row.map(User::from))
    }

    async fn find_org(&self, column: &str, value: &str) -> StoreResult<Option<Organization>> {
        let sql = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE {column} = $1");
        let row = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("find organization by {column}"))?;
        Ok(row.map(Organization::from))
    }
}

fn write_error(e: sqlx::Error, unique_field: &'static str, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(unique_field)
        }
        _ => StoreError::Backend(anyhow::Error::new(e).context(what.to_string())),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_user("email", email).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.find_user("id", id).await
    }

    async fn insert(&self, user: NewUser) -> StoreResult<String> {
        let id = new_object_id();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone_number,
                               role, is_active, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, FALSE)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(DEFAULT_ROLE)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "email", "insert user"))?;
        Ok(id)
    }

    async fn update_by_email(&self, email: &str, changes: &UserChanges) -> StoreResult<bool> {
        if changes.is_empty() {
            return Ok(self.find_by_email(email).await?.is_some());
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &changes.first_name {
            set.push("first_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.last_name {
            set.push("last_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.phone_number {
            set.push("phone_number = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.org_id {
            set.push("org_id = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.role {
            set.push("role = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.profile {
            set.push("profile = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &changes.education {
            set.push("education = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &changes.experience {
            set.push("experience = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &changes.projects {
            set.push("projects = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &changes.skills {
            set.push("skills = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = changes.is_deleted {
            set.push("is_deleted = ").push_bind_unseparated(v);
        }
        qb.push(" WHERE email = ").push_bind(email.to_string());

        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .context("update user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .context("update password hash")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_by_org(&self, org_id: &str, limit: usize) -> StoreResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE org_id = $1 ORDER BY created_at, id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(org_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .context("list users by organization")?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Organization>> {
        self.find_org("id", id).await
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Organization>> {
        self.find_org("name", name).await
    }

    async fn insert(&self, org: NewOrganization) -> StoreResult<String> {
        let id = new_object_id();
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, industry, description, location,
                                       org_email, org_phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(&org.name)
        .bind(&org.industry)
        .bind(&org.description)
        .bind(&org.location)
        .bind(&org.org_email)
        .bind(&org.org_phone_number)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "name", "insert organization"))?;
        Ok(id)
    }

    async fn update(&self, id: &str, changes: &OrganizationChanges) -> StoreResult<bool> {
        if changes.is_empty() {
            return Ok(self.find_org("id", id).await?.is_some());
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE organizations SET ");
        let mut set = qb.separated(", ");
        for (column, value) in [
            ("name", &changes.name),
            ("industry", &changes.industry),
            ("description", &changes.description),
            ("location", &changes.location),
            ("org_email", &changes.org_email),
            ("org_phone_number", &changes.org_phone_number),
        ] {
            if let Some(v) = value {
                set.push(format!("{column} = ")).push_bind_unseparated(v.clone());
            }
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "name", "update organization"))?;
        Ok(res.rows_affected() > 0)
    }
}
