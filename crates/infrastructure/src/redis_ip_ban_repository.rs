//! Redis-backed permanent ban repository.
//!
//! All bans live in one hash, `{prefix}:ip_bans`, mapping the address to
//! `"{created_epoch}|{reason}"`. `HSETNX` keeps the first ban's metadata.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::AsyncCommands;

use gatehouse_application::{IpBanRepository, PermanentBanStore};
use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{IpBan, LOGIN_ATTEMPTS_BAN_REASON};

/// Redis implementation of the ban repository port.
#[derive(Clone)]
pub struct RedisIpBanRepository {
    client: redis::Client,
    key_prefix: String,
}

impl RedisIpBanRepository {
    /// Creates a repository with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn bans_key(&self) -> String {
        format!("{}:ip_bans", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

fn encode_entry(created_at: DateTime<Utc>, reason: &str) -> String {
    format!("{}|{reason}", created_at.timestamp())
}

fn decode_entry(ip: String, value: &str) -> AppResult<IpBan> {
    let (epoch, reason) = value.split_once('|').ok_or_else(|| {
        AppError::Internal(format!("malformed redis ip ban entry for '{ip}'"))
    })?;
    let epoch = epoch.parse::<i64>().map_err(|error| {
        AppError::Internal(format!("invalid redis ip ban timestamp for '{ip}': {error}"))
    })?;
    let created_at = Utc.timestamp_opt(epoch, 0).single().ok_or_else(|| {
        AppError::Internal(format!("invalid redis ip ban timestamp for '{ip}': {epoch}"))
    })?;

    Ok(IpBan {
        ip,
        reason: reason.to_owned(),
        created_at,
    })
}

#[async_trait]
impl PermanentBanStore for RedisIpBanRepository {
    async fn create_permanent_ban(&self, ip: &str) -> AppResult<()> {
        self.create_ban(ip, LOGIN_ATTEMPTS_BAN_REASON).await
    }
}

#[async_trait]
impl IpBanRepository for RedisIpBanRepository {
    async fn is_banned(&self, ip: &str) -> AppResult<bool> {
        let mut connection = self.connection().await?;
        connection
            .hexists(self.bans_key(), ip)
            .await
            .map_err(|error| AppError::Internal(format!("failed to check redis ip ban: {error}")))
    }

    async fn create_ban(&self, ip: &str, reason: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: bool = connection
            .hset_nx(self.bans_key(), ip, encode_entry(Utc::now(), reason))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to create redis ip ban: {error}"))
            })?;
        Ok(())
    }

    async fn remove_ban(&self, ip: &str) -> AppResult<bool> {
        let mut connection = self.connection().await?;
        let removed: i64 = connection
            .hdel(self.bans_key(), ip)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to remove redis ip ban: {error}"))
            })?;
        Ok(removed > 0)
    }

    async fn list_bans(&self) -> AppResult<Vec<IpBan>> {
        let mut connection = self.connection().await?;
        let entries: HashMap<String, String> = connection
            .hgetall(self.bans_key())
            .await
            .map_err(|error| AppError::Internal(format!("failed to list redis ip bans: {error}")))?;

        let mut bans = entries
            .into_iter()
            .map(|(ip, value)| decode_entry(ip, &value))
            .collect::<AppResult<Vec<_>>>()?;
        bans.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.ip.cmp(&right.ip))
        });

        Ok(bans)
    }
}
