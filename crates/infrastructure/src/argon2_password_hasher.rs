//! Argon2id adapter for the password hashing port.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use gatehouse_application::PasswordHasher as PasswordHasherPort;
use gatehouse_core::{AppError, AppResult};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Cost {
    /// Memory per hash in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Lanes hashed in parallel.
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    /// 19 MiB, two passes, one lane.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hashes new passwords with the configured cost and verifies stored hashes
/// with whatever cost they were written with.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    engine: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Builds a hasher, rejecting cost values argon2 does not accept.
    pub fn with_cost(cost: Argon2Cost) -> AppResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|error| {
                AppError::Validation(format!("invalid argon2 cost {cost:?}: {error}"))
            })?;

        Ok(Self {
            engine: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.engine
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let stored = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is unreadable: {error}"))
        })?;

        match self.engine.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_application::PasswordHasher as _;
    use gatehouse_core::{AppError, AppResult};

    use super::{Argon2Cost, Argon2PasswordHasher};

    fn cheap() -> Argon2Cost {
        Argon2Cost {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn stored_hash_verifies_only_the_original_password() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::with_cost(cheap())?;
        let hash = hasher.hash_password("booru-admin-2024")?;

        assert!(hash.starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
        assert!(hasher.verify_password("booru-admin-2024", &hash)?);
        assert!(!hasher.verify_password("booru-admin-2025", &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_written_at_another_cost_still_verify() -> AppResult<()> {
        let old = Argon2PasswordHasher::with_cost(cheap())?;
        let hash = old.hash_password("hunter2")?;

        let current = Argon2PasswordHasher::with_cost(Argon2Cost {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })?;
        assert!(current.verify_password("hunter2", &hash)?);
        Ok(())
    }

    #[test]
    fn unusable_cost_is_rejected() {
        let zero_passes = Argon2Cost {
            iterations: 0,
            ..cheap()
        };
        assert!(matches!(
            Argon2PasswordHasher::with_cost(zero_passes),
            Err(AppError::Validation(_))
        ));
        assert!(Argon2PasswordHasher::with_cost(Argon2Cost::default()).is_ok());
    }

    #[test]
    fn malformed_stored_hash_is_an_internal_error() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::with_cost(cheap())?;
        let result = hasher.verify_password("anything", "plaintext-in-db");
        assert!(matches!(result, Err(AppError::Internal(_))));
        Ok(())
    }
}
