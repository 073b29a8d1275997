use serde::Serialize;

/// Stored organization document. Members are the users whose `org_id`
/// equals `id`; no membership list is kept here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub org_email: Option<String>,
    pub org_phone_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub org_email: Option<String>,
    pub org_phone_number: Option<String>,
}

impl NewOrganization {
    pub fn into_organization(self, id: String) -> Organization {
        Organization {
            id,
            name: self.name,
            industry: self.industry,
            description: self.description,
            location: self.location,
            org_email: self.org_email,
            org_phone_number: self.org_phone_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub org_email: Option<String>,
    pub org_phone_number: Option<String>,
}

impl OrganizationChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, org: &mut Organization) {
        if let Some(name) = &self.name {
            org.name.clone_from(name);
        }
        for (dst, src) in [
            (&mut org.industry, &self.industry),
            (&mut org.description, &self.description),
            (&mut org.location, &self.location),
            (&mut org.org_email, &self.org_email),
            (&mut org.org_phone_number, &self.org_phone_number),
        ] {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
    }
}
