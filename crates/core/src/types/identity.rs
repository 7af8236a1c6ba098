//! Authenticated identity and registration profile fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, Role, SignupRole, UserId};

/// The authenticated user's profile as known to the client.
///
/// Created from a successful login, registration or OTP completion response
/// and replaced wholesale whenever the profile is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// First and last name joined by a space, ignoring empty parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether this account runs a shop.
    #[must_use]
    pub fn is_barber(&self) -> bool {
        self.role == Role::Barber
    }
}

/// Profile fields supplied when creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Defaults to [`SignupRole::Customer`] when not given.
    pub role: Option<SignupRole>,
}

impl ProfileFields {
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            role: None,
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub const fn with_role(mut self, role: SignupRole) -> Self {
        self.role = Some(role);
        self
    }

    /// The role to request, applying the customer default.
    #[must_use]
    pub fn effective_role(&self) -> SignupRole {
        self.role.unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{
        "id": "u-1",
        "email": "Jane@Example.com",
        "firstName": "Jane",
        "lastName": "Doe",
        "role": "barber",
        "createdAt": "2024-05-01T10:00:00.000Z"
    }"#;

    #[test]
    fn test_deserialize_backend_user() {
        let identity: Identity = serde_json::from_str(USER_JSON).unwrap();
        assert_eq!(identity.id.as_str(), "u-1");
        assert_eq!(identity.email.as_str(), "jane@example.com");
        assert_eq!(identity.phone, None);
        assert!(identity.is_barber());
        assert_eq!(identity.full_name(), "Jane Doe");
    }

    #[test]
    fn test_rejects_unknown_role() {
        let json = USER_JSON.replace("barber", "owner");
        assert!(serde_json::from_str::<Identity>(&json).is_err());
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert!(serde_json::from_str::<Identity>(r#"{"id":"u-1"}"#).is_err());
    }

    #[test]
    fn test_full_name_skips_empty_parts() {
        let mut identity: Identity = serde_json::from_str(USER_JSON).unwrap();
        identity.last_name = String::new();
        assert_eq!(identity.full_name(), "Jane");
    }

    #[test]
    fn test_profile_fields_role_default() {
        let fields = ProfileFields::new("Sam", "Lee");
        assert_eq!(fields.effective_role(), SignupRole::Customer);
        let fields = fields.with_role(SignupRole::Barber).with_phone("555-0100");
        assert_eq!(fields.effective_role(), SignupRole::Barber);
        assert_eq!(fields.phone.as_deref(), Some("555-0100"));
    }
}
