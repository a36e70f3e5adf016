//! Session and role types

use serde::{Deserialize, Serialize};
use std::fmt;

/// User role, normalized once at session construction.
///
/// The backend reports roles as free-form strings; everything downstream
/// only ever compares these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Student,
    Instructor,
}

impl Role {
    /// Canonicalize a server-supplied role string.
    ///
    /// Case-insensitive and whitespace-tolerant; anything that is not
    /// `instructor` (including empty or unknown values) is a student.
    pub fn normalize(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("instructor") {
            Role::Instructor
        } else {
            Role::Student
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
        }
    }

    /// Default landing page for this role after login.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Instructor => "/instructor",
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::normalize(&raw)
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

/// The authenticated principal's credentials and profile, as persisted
/// client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
}

impl Session {
    /// A session is only usable with a non-empty token and user id.
    pub fn is_structurally_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.user_id.is_empty()
    }

    /// Sanity check that the access token has the three dot-separated
    /// segments of a JWT. Anything else in storage is stale garbage.
    pub fn token_is_well_formed(&self) -> bool {
        let mut segments = self.access_token.split('.');
        segments.clone().count() == 3 && segments.all(|s| !s.is_empty())
    }

    /// Display name fallback: the local part of the email address.
    pub fn default_name(email: &str) -> String {
        email.split('@').next().unwrap_or(email).to_string()
    }
}
