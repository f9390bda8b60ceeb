use serde::{Deserialize, Deserializer, Serialize};

use super::{Entity, SortValue};

/// Account role. Anything the server sends besides `admin` is a regular user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in account, stored next to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// `null` reads like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account as listed on the admin users page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Body of `PUT /users/{id}`. Unset fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    #[default]
    Username,
    Email,
    Role,
    Active,
}

impl Entity for ManagedUser {
    type Field = UserField;

    const ENDPOINT: &'static str = "/users";
    const SINGULAR: &'static str = "user";
    const PLURAL: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = [&self.username, &self.email]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .collect();
        if let Some(role) = &self.role {
            fields.push(role.as_str());
        }
        fields
    }

    fn sort_value(&self, field: UserField) -> Option<SortValue<'_>> {
        match field {
            UserField::Username => self.username.as_deref().map(SortValue::Text),
            UserField::Email => self.email.as_deref().map(SortValue::Text),
            UserField::Role => self.role.as_ref().map(|r| SortValue::Text(r.as_str())),
            UserField::Active => self.active.map(SortValue::Flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        let admin: Role = serde_json::from_str("\"admin\"").unwrap();
        let other: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(admin, Role::Admin);
        assert_eq!(other, Role::User);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_profile_ignores_extra_fields() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "usr_1",
            "username": "admin",
            "email": "admin@example.com",
            "password": "$2b$12$hash",
            "role": "admin",
            "active": true
        }))
        .unwrap();
        assert!(profile.is_admin());
    }

    #[test]
    fn test_profile_null_role_is_user() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "usr_2",
            "username": "bob",
            "role": null,
            "email": null
        }))
        .unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.email, "");
    }

    #[test]
    fn test_payload_skips_unset_fields() {
        let payload = UserPayload {
            role: Some(Role::User),
            active: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({ "role": "user", "active": false }));
    }
}
