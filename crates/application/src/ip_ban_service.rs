//! Permanent address ban ports and application service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{IpBan, canonical_ip};

use crate::PermanentBanStore;

/// Repository port for permanent address bans.
///
/// Extends [`PermanentBanStore`], which is the only part the login guard sees.
#[async_trait]
pub trait IpBanRepository: PermanentBanStore {
    /// Returns whether `ip` is currently banned.
    async fn is_banned(&self, ip: &str) -> AppResult<bool>;

    /// Inserts a ban with a reason. Existing bans are left untouched.
    async fn create_ban(&self, ip: &str, reason: &str) -> AppResult<()>;

    /// Removes the ban for `ip`. Returns whether a ban existed.
    async fn remove_ban(&self, ip: &str) -> AppResult<bool>;

    /// Lists all bans, newest first.
    async fn list_bans(&self) -> AppResult<Vec<IpBan>>;
}

/// Application service for reading and administering permanent bans.
#[derive(Clone)]
pub struct IpBanService {
    repository: Arc<dyn IpBanRepository>,
}

impl IpBanService {
    /// Creates a new ban service.
    #[must_use]
    pub fn new(repository: Arc<dyn IpBanRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether requests from `ip` must be rejected outright.
    pub async fn is_banned(&self, ip: &str) -> AppResult<bool> {
        self.repository.is_banned(ip).await
    }

    /// Bans `ip` on behalf of an administrator.
    ///
    /// The address is stored in canonical form so it matches request keys.
    pub async fn ban(&self, ip: &str, reason: &str) -> AppResult<()> {
        let ip = parse_ip(ip)?;
        let reason = reason.trim();
        let reason = if reason.is_empty() { "manual" } else { reason };

        self.repository.create_ban(&ip, reason).await?;
        info!(%ip, reason, "address banned by administrator");
        Ok(())
    }

    /// Lifts the ban for `ip`.
    pub async fn lift(&self, ip: &str) -> AppResult<()> {
        let ip = parse_ip(ip)?;
        if !self.repository.remove_ban(&ip).await? {
            return Err(AppError::NotFound(format!("no ban exists for '{ip}'")));
        }

        info!(%ip, "address ban lifted");
        Ok(())
    }

    /// Lists all bans, newest first.
    pub async fn list(&self) -> AppResult<Vec<IpBan>> {
        self.repository.list_bans().await
    }
}

fn parse_ip(value: &str) -> AppResult<String> {
    canonical_ip(value).ok_or_else(|| {
        AppError::Validation(format!("'{}' is not a valid ip address", value.trim()))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use gatehouse_core::{AppError, AppResult};
    use gatehouse_domain::{IpBan, LOGIN_ATTEMPTS_BAN_REASON};

    use super::{IpBanRepository, IpBanService};
    use crate::PermanentBanStore;

    #[derive(Default)]
    struct TestBanRepo {
        bans: Mutex<BTreeMap<String, String>>,
    }

    impl TestBanRepo {
        fn bans(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
            self.bans
                .lock()
                .map_err(|error| AppError::Internal(format!("failed to lock repo state: {error}")))
        }
    }

    #[async_trait]
    impl PermanentBanStore for TestBanRepo {
        async fn create_permanent_ban(&self, ip: &str) -> AppResult<()> {
            self.create_ban(ip, LOGIN_ATTEMPTS_BAN_REASON).await
        }
    }

    #[async_trait]
    impl IpBanRepository for TestBanRepo {
        async fn is_banned(&self, ip: &str) -> AppResult<bool> {
            Ok(self.bans()?.contains_key(ip))
        }

        async fn create_ban(&self, ip: &str, reason: &str) -> AppResult<()> {
            self.bans()?
                .entry(ip.to_owned())
                .or_insert_with(|| reason.to_owned());
            Ok(())
        }

        async fn remove_ban(&self, ip: &str) -> AppResult<bool> {
            Ok(self.bans()?.remove(ip).is_some())
        }

        async fn list_bans(&self) -> AppResult<Vec<IpBan>> {
            Ok(self
                .bans()?
                .iter()
                .map(|(ip, reason)| IpBan {
                    ip: ip.clone(),
                    reason: reason.clone(),
                    created_at: Utc::now(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn ban_then_lift_round_trip() {
        let service = IpBanService::new(Arc::new(TestBanRepo::default()));

        assert!(service.ban(" 5.5.5.5 ", "spam").await.is_ok());
        assert!(service.is_banned("5.5.5.5").await.unwrap_or(false));

        assert!(service.lift("5.5.5.5").await.is_ok());
        assert!(!service.is_banned("5.5.5.5").await.unwrap_or(true));
    }

    #[tokio::test]
    async fn lifting_unknown_ban_is_not_found() {
        let service = IpBanService::new(Arc::new(TestBanRepo::default()));
        let result = service.lift("7.7.7.7").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_addresses_are_rejected() {
        let service = IpBanService::new(Arc::new(TestBanRepo::default()));

        for input in ["   ", "01.02.03.04", "example.org"] {
            let result = service.ban(input, "spam").await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert!(matches!(
            service.lift("not-an-ip").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn bans_are_stored_in_request_key_form() {
        let service = IpBanService::new(Arc::new(TestBanRepo::default()));

        assert!(service.ban("::FFFF:1.2.3.4", "spam").await.is_ok());
        assert!(service.ban(" 2001:DB8::0001 ", "spam").await.is_ok());
        assert!(service.is_banned("1.2.3.4").await.unwrap_or(false));
        assert!(service.is_banned("2001:db8::1").await.unwrap_or(false));

        assert!(service.lift(" ::ffff:1.2.3.4").await.is_ok());
        assert!(!service.is_banned("1.2.3.4").await.unwrap_or(true));
    }

    #[tokio::test]
    async fn repeated_ban_keeps_first_reason() {
        let repo = Arc::new(TestBanRepo::default());
        let service = IpBanService::new(repo.clone());

        assert!(repo.create_permanent_ban("8.8.8.8").await.is_ok());
        assert!(service.ban("8.8.8.8", "").await.is_ok());

        let bans = service.list().await.unwrap_or_default();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].reason, LOGIN_ATTEMPTS_BAN_REASON);
    }
}
