use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Closed set of account roles. Assigned at account creation by an admin.
///
/// The backend spells roles in upper case in user payloads and in lower case
/// inside JWT claims, so parsing is case-insensitive. Anything outside the
/// set fails here and never reaches the workflow engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Agent,
    Responsible,
    Technician,
    Provider,
    Manager,
    Admin,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}` (expected agent|responsible|technician|provider|manager|admin)")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Agent,
        Role::Responsible,
        Role::Technician,
        Role::Provider,
        Role::Manager,
        Role::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Responsible => "responsible",
            Self::Technician => "technician",
            Self::Provider => "provider",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Upper-case spelling expected by the backend's registration endpoint.
    pub fn wire_name(self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let normalized = normalized.strip_prefix("role_").unwrap_or(normalized.as_str());
        match normalized {
            "agent" => Ok(Self::Agent),
            // older dashboards spelled it the French way
            "responsible" | "responsable" => Ok(Self::Responsible),
            "technician" => Ok(Self::Technician),
            "provider" => Ok(Self::Provider),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight user reference embedded in demands, quotes and comments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserRef {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
