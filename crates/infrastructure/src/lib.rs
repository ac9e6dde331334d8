//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_ip_ban_repository;
mod postgres_user_repository;
mod redis_ip_ban_repository;
mod system_clock;

pub use argon2_password_hasher::{Argon2Cost, Argon2PasswordHasher};
pub use postgres_ip_ban_repository::PostgresIpBanRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_ip_ban_repository::RedisIpBanRepository;
pub use system_clock::SystemClock;
