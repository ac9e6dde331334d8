use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason recorded when the login guard escalates an address.
pub const LOGIN_ATTEMPTS_BAN_REASON: &str = "login_attempts";

/// A persisted, indefinite ban of one client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpBan {
    /// Banned address, stored exactly as the request reported it.
    pub ip: String,
    /// Free-text reason shown to administrators.
    pub reason: String,
    /// When the ban was created.
    pub created_at: DateTime<Utc>,
}

/// Returns the canonical text form of an address, or `None` if `value` is
/// not an IP address.
///
/// IPv4-mapped IPv6 addresses fold to IPv4 and IPv6 is compressed and
/// lower-cased, matching how request addresses are keyed.
#[must_use]
pub fn canonical_ip(value: &str) -> Option<String> {
    value
        .trim()
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_canonical().to_string())
}
