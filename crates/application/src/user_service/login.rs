use tracing::{info, warn};

use super::*;

impl UserService {
    /// Authenticates a user with username and password from `ip_address`.
    ///
    /// Returns `AuthOutcome::Throttled` without touching the user table when
    /// the login guard refuses the address.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
    ) -> AppResult<AuthOutcome> {
        if !self.login_guard.can_attempt(ip_address).await? {
            warn!(ip = ip_address, "login refused by attempt guard");
            return Ok(AuthOutcome::Throttled);
        }

        let Some(user) = self.user_repository.find_by_username(username.trim()).await? else {
            // Hash anyway so unknown usernames cost the same as known ones.
            let _ = self.password_hasher.hash_password(password);
            info!(ip = ip_address, username, outcome = "unknown_user", "login failed");
            return Ok(AuthOutcome::Failed);
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            info!(ip = ip_address, username, outcome = "invalid_password", "login failed");
            return Ok(AuthOutcome::Failed);
        }

        if user.banned {
            info!(ip = ip_address, username, outcome = "account_banned", "login failed");
            return Ok(AuthOutcome::Failed);
        }

        self.login_guard.clear_attempts(ip_address)?;
        info!(ip = ip_address, user_id = %user.id, "login succeeded");

        Ok(AuthOutcome::Authenticated(user))
    }
}
