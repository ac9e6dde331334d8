//! Per-address login attempt tracking with escalating temporary bans.
//!
//! An [`AttemptRecord`] is a small state machine. It starts clean, lets a
//! burst of attempts through, then locks the address out for a window that
//! grows by a fixed step each time. Expiry is evaluated lazily on the next
//! attempt; nothing here runs on a timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tunables for the login attempt guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGuardPolicy {
    /// A ban triggers once the recorded tries exceed this value.
    ///
    /// The check runs before the current attempt is counted, so with the
    /// default of 5 six attempts pass and the seventh is refused.
    pub max_tries: u32,
    /// Length of the first temporary ban, in minutes.
    pub initial_ban_minutes: i64,
    /// Minutes added to the ban length after every ban.
    pub ban_minutes_step: i64,
    /// Number of temporary bans after which a permanent ban is requested.
    pub permanent_ban_after: u32,
}

impl Default for LoginGuardPolicy {
    fn default() -> Self {
        Self {
            max_tries: 5,
            initial_ban_minutes: 1,
            ban_minutes_step: 1,
            permanent_ban_after: 10,
        }
    }
}

/// Outcome of registering one attempt against an [`AttemptRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// The attempt may proceed to credential verification.
    Allowed,
    /// The address is inside an existing ban window. Nothing was counted.
    StillBanned,
    /// This attempt started a new temporary ban.
    TemporaryBanIssued {
        /// When the new ban lifts.
        unban_at: DateTime<Utc>,
    },
    /// This attempt started a temporary ban and crossed the permanent threshold.
    PermanentBanIssued {
        /// When the temporary part of the ban lifts.
        unban_at: DateTime<Utc>,
    },
}

impl AttemptDecision {
    /// Returns whether the caller may go on to check credentials.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns whether the caller must persist a permanent ban.
    #[must_use]
    pub fn requires_permanent_ban(&self) -> bool {
        matches!(self, Self::PermanentBanIssued { .. })
    }
}

/// Attempt counters tracked for one client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempts since the last ban or reset.
    pub tries: u32,
    /// Length of the next temporary ban, in minutes.
    pub ban_minutes: i64,
    /// Temporary bans issued since the record was created.
    pub ban_count: u32,
    /// End of the current ban window, if any.
    pub unban_at: Option<DateTime<Utc>>,
    /// Time of the latest attempt, banned or not.
    pub last_attempt_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Creates a clean record.
    #[must_use]
    pub fn new(policy: &LoginGuardPolicy, now: DateTime<Utc>) -> Self {
        Self {
            tries: 0,
            ban_minutes: policy.initial_ban_minutes,
            ban_count: 0,
            unban_at: None,
            last_attempt_at: now,
        }
    }

    /// Registers one login attempt at `now` and returns the decision.
    pub fn register_attempt(
        &mut self,
        now: DateTime<Utc>,
        policy: &LoginGuardPolicy,
    ) -> AttemptDecision {
        self.last_attempt_at = now;

        if let Some(unban_at) = self.unban_at {
            if now > unban_at {
                self.unban_at = None;
            } else {
                return AttemptDecision::StillBanned;
            }
        }

        if self.tries > policy.max_tries {
            let unban_at = now + Duration::minutes(self.ban_minutes);
            self.tries = 0;
            self.unban_at = Some(unban_at);
            self.ban_minutes += policy.ban_minutes_step;
            self.ban_count += 1;

            if self.ban_count >= policy.permanent_ban_after {
                return AttemptDecision::PermanentBanIssued { unban_at };
            }

            return AttemptDecision::TemporaryBanIssued { unban_at };
        }

        self.tries += 1;
        AttemptDecision::Allowed
    }

    /// Returns whether a ban window is still open at `now`.
    #[must_use]
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        self.unban_at.is_some_and(|unban_at| now <= unban_at)
    }

    /// Returns whether the record has been idle since before `cutoff` and is
    /// not serving a ban.
    #[must_use]
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.last_attempt_at < cutoff && !self.is_banned_at(now)
    }
}
