//! Application services and ports.

#![forbid(unsafe_code)]

mod ip_ban_service;
mod login_guard_service;
mod user_service;

pub use ip_ban_service::{IpBanRepository, IpBanService};
pub use login_guard_service::{Clock, LoginAttemptGuard, PermanentBanStore};
pub use user_service::{AuthOutcome, PasswordHasher, UserRecord, UserRepository, UserService};
