use serde::{Deserialize, Serialize};

use super::model::{Education, Experience, Profile, Project, Skill, UserChanges};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Self-service profile update. Absent (or null) fields are left alone; an
/// empty list clears the stored collection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
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

impl From<UpdateUserRequest> for UserChanges {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            phone_number: r.phone_number,
            org_id: r.org_id,
            role: r.role,
            profile: r.profile,
            education: r.education,
            experience: r.experience,
            projects: r.projects,
            skills: r.skills,
            is_deleted: r.is_deleted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_collections_differ() {
        let absent: UpdateUserRequest = serde_json::from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert!(absent.skills.is_none());

        let cleared: UpdateUserRequest = serde_json::from_str(r#"{"skills":[]}"#).unwrap();
        assert_eq!(cleared.skills, Some(vec![]));
    }

    #[test]
    fn unknown_fields_produce_empty_changes() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email":"new@example.com","password_hash":"x"}"#).unwrap();
        assert!(UserChanges::from(req).is_empty());
    }

    #[test]
    fn profile_is_a_single_object() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"profile":{"headline":"Engineer","hourly_rate":55.5}}"#)
                .unwrap();
        let profile = req.profile.unwrap();
        assert_eq!(profile.headline.as_deref(), Some("Engineer"));
        assert_eq!(profile.hourly_rate, Some(55.5));
        assert!(serde_json::from_str::<UpdateUserRequest>(r#"{"profile":[{}]}"#).is_err());
    }
}
