//! Users, as the server reports them

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ROLE_PREFIX;

/// The role of a user.
///
/// Variants are declared from the least to the most privileged, so that `Ord` tells which role wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    /// The bare role name, as used in JSON payloads (e.g. `ADMIN`)
    pub fn name(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    /// The authority string the server puts in a session for this role (e.g. `ROLE_ADMIN`)
    pub fn authority(&self) -> String {
        format!("{}{}", ROLE_PREFIX, self.name())
    }

    /// Parse an authority such as `ROLE_MANAGER`.
    /// Bare role names are accepted as well. Unknown authorities return `None`
    pub fn from_authority(authority: &str) -> Option<Self> {
        let bare = authority.strip_prefix(ROLE_PREFIX).unwrap_or(authority);
        bare.parse().ok()
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role {:?}", other)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A user record. The server owns it, we only hold a copy of what the last fetch returned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    id: i64,
    username: String,
    role: Role,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    manager: Option<Box<UserRef>>,
}

impl UserRef {
    pub fn new(id: i64, username: String, role: Role, email: Option<String>, manager: Option<UserRef>) -> Self {
        Self { id, username, role, email, manager: manager.map(Box::new) }
    }

    pub fn id(&self) -> i64                  { self.id }
    pub fn username(&self) -> &str           { &self.username }
    pub fn role(&self) -> Role               { self.role }
    pub fn email(&self) -> Option<&str>      { self.email.as_deref() }
    pub fn manager(&self) -> Option<&UserRef> { self.manager.as_deref() }

    /// Whether `other` is the direct manager of this user
    pub fn is_managed_by(&self, other_id: i64) -> bool {
        self.manager().map(|m| m.id() == other_id).unwrap_or(false)
    }
}

/// The body of a "create user" request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub email: String,
}

/// The body of an "update user" request.
///
/// The server leaves a field untouched when it is empty
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    pub email: String,
    pub password: String,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.trim().is_empty() && self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_authorities() {
        assert_eq!(Role::from_authority("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_authority("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::from_authority("ROLE_ANONYMOUS"), None);
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert!(Role::Admin > Role::Manager && Role::Manager > Role::User);
    }

    #[test]
    fn deserialize_server_user() {
        let json = r#"{
            "id": 7, "username": "bob", "password": "$2a$10$hash", "role": "USER", "email": null,
            "manager": { "id": 2, "username": "manager", "role": "MANAGER", "email": "manager@example.com", "manager": null }
        }"#;
        let user: UserRef = serde_json::from_str(json).unwrap();
        assert_eq!(user.username(), "bob");
        assert_eq!(user.email(), None);
        assert_eq!(user.manager().map(|m| m.username()), Some("manager"));
        assert!(user.is_managed_by(2));
        assert!(!user.is_managed_by(7));
    }
}
