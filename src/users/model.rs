use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "freelancer";

/// Stored user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub org_id: Option<String>,
    pub profile: Option<Profile>,
    pub education: Option<Vec<Education>>,
    pub experience: Option<Vec<Experience>>,
    pub projects: Option<Vec<Project>>,
    pub skills: Option<Vec<Skill>>,
}

/// Single profile object; replaced wholesale on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub school_name: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company_name: String,
    pub job_title: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_is_current")]
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub skill_name: String,
    #[serde(default = "default_endorsements")]
    pub endorsements: Option<i64>,
    #[serde(default)]
    pub proficiency: Option<String>,
}

fn default_is_current() -> Option<bool> {
    Some(false)
}

fn default_endorsements() -> Option<i64> {
    Some(0)
}

/// Fields written on registration; status fields are defaulted by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: String) -> User {
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
            is_deleted: false,
            org_id: None,
            profile: None,
            education: None,
            experience: None,
            projects: None,
            skills: None,
        }
    }
}

/// A partial update. `None` leaves the stored field untouched, `Some`
/// overwrites it; collections are replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub org_id: Option<String>,
    pub role: Option<String>,
    pub profile: Option<Profile>,
    pub education: Option<Vec<Education>>,
    pub experience: Option<Vec<Experience>>,
    pub projects: Option<Vec<Project>>,
    pub skills: Option<Vec<Skill>>,
    pub is_deleted: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the present fields onto `user`.
    pub fn apply_to(&self, user: &mut User) {
        fn set<T: Clone>(dst: &mut T, src: &Option<T>) {
            if let Some(v) = src {
                *dst = v.clone();
            }
        }
        fn set_opt<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        set_opt(&mut user.first_name, &self.first_name);
        set_opt(&mut user.last_name, &self.last_name);
        set_opt(&mut user.phone_number, &self.phone_number);
        set_opt(&mut user.org_id, &self.org_id);
        set(&mut user.role, &self.role);
        set_opt(&mut user.profile, &self.profile);
        set_opt(&mut user.education, &self.education);
        set_opt(&mut user.experience, &self.experience);
        set_opt(&mut user.projects, &self.projects);
        set_opt(&mut user.skills, &self.skills);
        set(&mut user.is_deleted, &self.is_deleted);
    }
}
