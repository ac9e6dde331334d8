use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Site roles, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular account.
    User,
    /// Can moderate content.
    Moderator,
    /// Full administrative access, including IP bans.
    Admin,
}

impl UserRole {
    /// Returns the stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::Validation(format!("unknown user role '{other}'"))),
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    username: String,
    role: UserRole,
}

impl UserIdentity {
    /// Creates a user identity from a verified sign-in.
    #[must_use]
    pub fn new(subject: impl Into<String>, username: impl Into<String>, role: UserRole) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            role,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the username the user signed in with.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the role granted to the user.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Returns whether the user holds at least the given role.
    #[must_use]
    pub fn has_role(&self, required: UserRole) -> bool {
        self.role >= required
    }
}
