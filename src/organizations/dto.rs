use serde::Deserialize;

use super::model::{NewOrganization, OrganizationChanges};

#[derive(Debug, Deserialize)]
pub struct RegisterOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub org_email: Option<String>,
    #[serde(default)]
    pub org_phone_number: Option<String>,
}

impl From<RegisterOrganizationRequest> for NewOrganization {
    fn from(r: RegisterOrganizationRequest) -> Self {
        Self {
            name: r.name,
            industry: r.industry,
            description: r.description,
            location: r.location,
            org_email: r.org_email,
            org_phone_number: r.org_phone_number,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub org_email: Option<String>,
    pub org_phone_number: Option<String>,
}

impl From<UpdateOrganizationRequest> for OrganizationChanges {
    fn from(r: UpdateOrganizationRequest) -> Self {
        Self {
            name: r.name,
            industry: r.industry,
            description: r.description,
            location: r.location,
            org_email: r.org_email,
            org_phone_number: r.org_phone_number,
        }
    }
}
