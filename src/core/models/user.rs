use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub static ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Value side of the `users.json` mapping. The username is the map key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(alias = "password")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<NaiveDateTime>,
}

pub type Users = BTreeMap<String, User>;

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub username: String,
    pub role: Role,
    pub last_modified: Option<NaiveDateTime>,
}

impl Profile {
    pub fn new(username: &str, user: &User) -> Self {
        Self {
            username: username.to_owned(),
            role: user.role,
            last_modified: user.last_modified,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Create {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}
