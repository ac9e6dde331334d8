use gatehouse_core::UserIdentity;
use gatehouse_domain::IpBan;
use serde::{Deserialize, Serialize};

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for username/password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity of the signed-in user.
#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub username: String,
    pub role: String,
}

impl From<&UserIdentity> for UserIdentityResponse {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            username: identity.username().to_owned(),
            role: identity.role().to_string(),
        }
    }
}

/// Incoming payload for a manual address ban.
#[derive(Debug, Deserialize)]
pub struct CreateIpBanRequest {
    pub ip: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// API representation of a permanent address ban.
#[derive(Debug, Serialize)]
pub struct IpBanResponse {
    pub ip: String,
    pub reason: String,
    pub created_at: String,
}

impl From<IpBan> for IpBanResponse {
    fn from(ban: IpBan) -> Self {
        Self {
            ip: ban.ip,
            reason: ban.reason,
            created_at: ban.created_at.to_rfc3339(),
        }
    }
}
