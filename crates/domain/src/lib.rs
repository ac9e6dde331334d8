//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod ip_ban;
mod login_attempt;
mod user;

pub use ip_ban::{IpBan, LOGIN_ATTEMPTS_BAN_REASON, canonical_ip};
pub use login_attempt::{AttemptDecision, AttemptRecord, LoginGuardPolicy};
pub use user::UserId;
