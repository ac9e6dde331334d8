//! Login attempt guard ports and application service.
//!
//! Tracks login attempts per client address in process memory, locks an
//! address out for a growing window after a burst of attempts, and asks the
//! permanent ban store to take over once an address has been locked out too
//! many times. State is not shared across processes and is lost on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{AttemptDecision, AttemptRecord, LoginGuardPolicy};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Write-only port for persisting permanent address bans.
#[async_trait]
pub trait PermanentBanStore: Send + Sync {
    /// Persists a permanent ban for `ip`.
    ///
    /// Must be idempotent: banning an already banned address succeeds.
    async fn create_permanent_ban(&self, ip: &str) -> AppResult<()>;
}

/// Time source for services that make time-based decisions.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Gate consulted before every credential check.
///
/// Cloning is cheap and clones share the same attempt table, so one instance
/// is built at start-up and handed to every request.
#[derive(Clone)]
pub struct LoginAttemptGuard {
    policy: LoginGuardPolicy,
    attempts: Arc<Mutex<HashMap<String, AttemptRecord>>>,
    ban_store: Arc<dyn PermanentBanStore>,
    clock: Arc<dyn Clock>,
}

impl LoginAttemptGuard {
    /// Creates a guard with an empty attempt table.
    #[must_use]
    pub fn new(
        policy: LoginGuardPolicy,
        ban_store: Arc<dyn PermanentBanStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            attempts: Arc::new(Mutex::new(HashMap::new())),
            ban_store,
            clock,
        }
    }

    /// Returns the policy this guard enforces.
    #[must_use]
    pub fn policy(&self) -> &LoginGuardPolicy {
        &self.policy
    }

    /// Registers a login attempt from `ip` and returns whether it may proceed.
    ///
    /// `false` means the caller must reject the login without checking
    /// credentials. When this attempt pushes the address over the permanent
    /// threshold the ban store is awaited, and its failure is returned.
    pub async fn can_attempt(&self, ip: &str) -> AppResult<bool> {
        let now = self.clock.now();
        let decision = {
            let mut attempts = self.lock_attempts()?;
            let record = attempts
                .entry(ip.to_owned())
                .or_insert_with(|| AttemptRecord::new(&self.policy, now));
            let decision = record.register_attempt(now, &self.policy);

            if let AttemptDecision::TemporaryBanIssued { unban_at }
            | AttemptDecision::PermanentBanIssued { unban_at } = decision
            {
                info!(
                    ip,
                    ban_count = record.ban_count,
                    %unban_at,
                    "temporarily banned address after repeated login attempts"
                );
            }

            decision
        };

        if decision.requires_permanent_ban() {
            warn!(ip, "permanently banning address after repeated temporary bans");
            self.ban_store.create_permanent_ban(ip).await?;
        }

        Ok(decision.is_allowed())
    }

    /// Forgets everything recorded for `ip`. Called after a verified login.
    pub fn clear_attempts(&self, ip: &str) -> AppResult<()> {
        self.lock_attempts()?.remove(ip);
        Ok(())
    }

    /// Returns a snapshot of the record kept for `ip`, if any.
    pub fn attempt_record(&self, ip: &str) -> AppResult<Option<AttemptRecord>> {
        Ok(self.lock_attempts()?.get(ip).copied())
    }

    /// Returns how many addresses currently have a record.
    pub fn tracked_addresses(&self) -> AppResult<usize> {
        Ok(self.lock_attempts()?.len())
    }

    /// Drops records idle for longer than `max_idle` that are not serving a ban.
    ///
    /// A pruned address starts over from the initial ban length. Returns the
    /// number of records removed.
    pub fn prune_idle(&self, max_idle: Duration) -> AppResult<usize> {
        let now = self.clock.now();
        let cutoff = now - max_idle;
        let mut attempts = self.lock_attempts()?;
        let before = attempts.len();
        attempts.retain(|_, record| !record.is_idle_since(cutoff, now));
        Ok(before - attempts.len())
    }

    fn lock_attempts(&self) -> AppResult<MutexGuard<'_, HashMap<String, AttemptRecord>>> {
        self.attempts.lock().map_err(|error| {
            AppError::Internal(format!("failed to lock login attempt table: {error}"))
        })
    }
}
