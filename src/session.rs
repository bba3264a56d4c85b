//! Who is logged in, and what the UI should offer them
//!
//! Every check in this module is advisory: it decides what to show, the server decides what is allowed.

use serde::Deserialize;
use bitflags::bitflags;

use crate::config::ROLE_PREFIX;
use crate::task::{Task, TaskStatus};
use crate::user::{Role, UserRef};

/// The username the server reports for unauthenticated callers
const ANONYMOUS_USERNAME: &str = "anonymousUser";
/// The authority the server grants to unauthenticated callers
const ANONYMOUS_AUTHORITY: &str = "ROLE_ANONYMOUS";

/// The payload of the identity endpoint
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Me {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<Authority>,
}

/// A granted authority. The server sends `{"authority": "ROLE_X"}`, some setups send a bare string
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Authority {
    Object { authority: String },
    Plain(String),
}

impl Authority {
    pub fn as_str(&self) -> &str {
        match self {
            Authority::Object { authority } => authority,
            Authority::Plain(authority) => authority,
        }
    }
}

/// The authenticated user
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    username: String,
    /// The identity endpoint does not tell our id, it is only known once we find ourselves in a user list
    id: Option<i64>,
}

impl Identity {
    pub fn new(username: String) -> Self {
        Self { username, id: None }
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn id(&self) -> Option<i64> { self.id }

    /// Whether `user` is this identity
    pub fn is(&self, user: &UserRef) -> bool {
        match self.id {
            Some(id) => id == user.id(),
            None => self.username == user.username(),
        }
    }
}

bitflags! {
    /// What the UI may offer to the current user
    pub struct Permissions: u8 {
        /// Show the user administration section, and fetch the user list
        const MANAGE_USERS = 1;
        /// Offer other users than oneself in the assignment list
        const ASSIGN_OTHERS = 2;
        /// Offer approve/reject on pending tasks
        const REVIEW_TASKS = 4;
        /// Offer deletion of tasks created by someone else
        const DELETE_ANY_TASK = 8;
    }
}

/// The current session.
///
/// Identity and roles are always set together: a session is either anonymous, or fully authenticated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    identity: Option<Identity>,
    roles: Vec<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity, roles: Vec<String>) -> Self {
        Self { identity: Some(identity), roles }
    }

    /// Interpret the payload of the identity endpoint.
    /// Missing, empty and anonymous identities all give an anonymous session
    pub fn from_me(me: Me) -> Self {
        let username = match me.username {
            None => return Self::anonymous(),
            Some(name) => name,
        };
        if username.trim().is_empty() || username == ANONYMOUS_USERNAME {
            return Self::anonymous();
        }
        let roles: Vec<String> = me.roles.iter().map(|a| a.as_str().to_string()).collect();
        if roles.iter().any(|r| r == ANONYMOUS_AUTHORITY) {
            return Self::anonymous();
        }
        Self::authenticated(Identity::new(username), roles)
    }

    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }
    pub fn roles(&self) -> &[String] { &self.roles }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether `name` (e.g. `ADMIN` or `ROLE_ADMIN`) is one of the session roles
    pub fn has_role(&self, name: &str) -> bool {
        let wanted = if name.starts_with(ROLE_PREFIX) {
            name.to_string()
        } else {
            format!("{}{}", ROLE_PREFIX, name)
        };
        self.roles.iter().any(|r| *r == wanted)
    }

    /// The most privileged known role of this session
    pub fn primary_role(&self) -> Option<Role> {
        self.roles.iter()
            .filter_map(|r| Role::from_authority(r))
            .max()
    }

    /// Record our own user id, once a user list told us
    pub fn resolve_id(&mut self, users: &[UserRef]) {
        if let Some(identity) = self.identity.as_mut() {
            if let Some(me) = users.iter().find(|u| u.username() == identity.username) {
                if identity.id != Some(me.id()) {
                    log::debug!("Our user id is {}", me.id());
                    identity.id = Some(me.id());
                }
            }
        }
    }

    pub fn permissions(&self) -> Permissions {
        match self.primary_role() {
            Some(Role::Admin) => Permissions::all(),
            Some(Role::Manager) => Permissions::MANAGE_USERS | Permissions::ASSIGN_OTHERS | Permissions::REVIEW_TASKS,
            Some(Role::User) | None => Permissions::empty(),
        }
    }

    pub fn can_manage_users(&self) -> bool {
        self.permissions().contains(Permissions::MANAGE_USERS)
    }

    pub fn can_assign_others(&self) -> bool {
        self.permissions().contains(Permissions::ASSIGN_OTHERS)
    }

    /// Whether approve/reject should be offered for this task
    pub fn can_review(&self, task: &Task) -> bool {
        self.permissions().contains(Permissions::REVIEW_TASKS) && task.status() == TaskStatus::Pending
    }

    /// Whether delete should be offered for this task
    pub fn can_delete(&self, task: &Task) -> bool {
        if self.permissions().contains(Permissions::DELETE_ANY_TASK) {
            return true;
        }
        match (self.identity.as_ref(), task.create_user()) {
            (Some(identity), Some(creator)) => identity.is(creator),
            (Some(identity), None) => identity.id.is_some() && identity.id == task.create_user_id(),
            _ => false,
        }
    }

    /// The roles this session may give to the users it creates
    pub fn creatable_roles(&self) -> Vec<Role> {
        match self.primary_role() {
            Some(Role::Admin) => vec![Role::Manager, Role::User],
            Some(Role::Manager) => vec![Role::User],
            Some(Role::User) | None => Vec::new(),
        }
    }
}
