use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_core::{AppResult, UserRole};
use gatehouse_domain::{LoginGuardPolicy, UserId};

use super::{AuthOutcome, PasswordHasher, UserRecord, UserRepository, UserService};
use crate::{Clock, LoginAttemptGuard, PermanentBanStore};

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }
}

struct NoopBanStore;

#[async_trait]
impl PermanentBanStore for NoopBanStore {
    async fn create_permanent_ban(&self, _ip: &str) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct TestUserRepo {
    users: HashMap<String, UserRecord>,
    lookups: Mutex<usize>,
}

impl TestUserRepo {
    fn with_user(username: &str, password: &str, banned: bool) -> Self {
        let mut users = HashMap::new();
        users.insert(
            username.to_lowercase(),
            UserRecord {
                id: UserId::new(),
                username: username.to_owned(),
                password_hash: format!("hashed:{password}"),
                role: UserRole::User,
                banned,
            },
        );
        Self {
            users,
            lookups: Mutex::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.lock().map(|count| *count).unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for TestUserRepo {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        if let Ok(mut count) = self.lookups.lock() {
            *count += 1;
        }
        Ok(self.users.get(&username.to_lowercase()).cloned())
    }
}

struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

fn service_with(repo: Arc<TestUserRepo>) -> (UserService, LoginAttemptGuard) {
    let guard = LoginAttemptGuard::new(
        LoginGuardPolicy::default(),
        Arc::new(NoopBanStore),
        Arc::new(FixedClock),
    );
    let service = UserService::new(repo, Arc::new(PlainHasher), guard.clone());
    (service, guard)
}

#[tokio::test]
async fn valid_credentials_authenticate_and_clear_attempts() {
    let repo = Arc::new(TestUserRepo::with_user("Alice", "hunter22", false));
    let (service, guard) = service_with(repo);

    for _ in 0..3 {
        let outcome = service.login("alice", "wrong", "1.2.3.4").await;
        assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
    }

    let outcome = service.login("ALICE", "hunter22", "1.2.3.4").await;
    assert!(matches!(outcome, Ok(AuthOutcome::Authenticated(ref user)) if user.username == "Alice"));
    assert!(guard.attempt_record("1.2.3.4").ok().flatten().is_none());
}

#[tokio::test]
async fn throttled_address_skips_credential_check() {
    let repo = Arc::new(TestUserRepo::with_user("alice", "hunter22", false));
    let (service, _guard) = service_with(repo.clone());

    for _ in 0..6 {
        let outcome = service.login("alice", "wrong", "1.2.3.4").await;
        assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
    }
    assert_eq!(repo.lookups(), 6);

    let outcome = service.login("alice", "hunter22", "1.2.3.4").await;
    assert!(matches!(outcome, Ok(AuthOutcome::Throttled)));
    assert_eq!(repo.lookups(), 6);
}

#[tokio::test]
async fn unknown_user_and_banned_account_fail_generically() {
    let repo = Arc::new(TestUserRepo::with_user("mallory", "secret", true));
    let (service, guard) = service_with(repo);

    let unknown = service.login("nobody", "secret", "5.6.7.8").await;
    assert!(matches!(unknown, Ok(AuthOutcome::Failed)));

    let banned = service.login("mallory", "secret", "5.6.7.8").await;
    assert!(matches!(banned, Ok(AuthOutcome::Failed)));

    let tries = guard
        .attempt_record("5.6.7.8")
        .ok()
        .flatten()
        .map(|record| record.tries);
    assert_eq!(tries, Some(2));
}

#[tokio::test]
async fn identity_carries_role_and_subject() {
    let repo = Arc::new(TestUserRepo::with_user("bob", "pw", false));
    let (service, _guard) = service_with(repo);

    let Ok(AuthOutcome::Authenticated(user)) = service.login("bob", "pw", "9.9.9.9").await else {
        panic!("expected bob to authenticate");
    };

    let identity = user.identity();
    assert_eq!(identity.subject(), user.id.to_string());
    assert_eq!(identity.username(), "bob");
    assert_eq!(identity.role(), UserRole::User);
}
