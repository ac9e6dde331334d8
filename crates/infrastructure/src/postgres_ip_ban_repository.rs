//! PostgreSQL-backed permanent ban repository using the `ip_bans` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use gatehouse_application::{IpBanRepository, PermanentBanStore};
use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{IpBan, LOGIN_ATTEMPTS_BAN_REASON};

/// PostgreSQL implementation of the ban repository port.
#[derive(Clone)]
pub struct PostgresIpBanRepository {
    pool: PgPool,
}

impl PostgresIpBanRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermanentBanStore for PostgresIpBanRepository {
    async fn create_permanent_ban(&self, ip: &str) -> AppResult<()> {
        self.create_ban(ip, LOGIN_ATTEMPTS_BAN_REASON).await
    }
}

#[async_trait]
impl IpBanRepository for PostgresIpBanRepository {
    async fn is_banned(&self, ip: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM ip_bans WHERE ip = $1)
            "#,
        )
        .bind(ip)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check ip ban: {error}")))
    }

    async fn create_ban(&self, ip: &str, reason: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO ip_bans (ip, reason, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (ip) DO NOTHING
            "#,
        )
        .bind(ip)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create ip ban: {error}")))?;

        if result.rows_affected() == 0 {
            debug!(ip, "ip ban already present");
        }

        Ok(())
    }

    async fn remove_ban(&self, ip: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM ip_bans
            WHERE ip = $1
            "#,
        )
        .bind(ip)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove ip ban: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_bans(&self) -> AppResult<Vec<IpBan>> {
        let rows = sqlx::query_as::<_, IpBanRow>(
            r#"
            SELECT ip, reason, created_at
            FROM ip_bans
            ORDER BY created_at DESC, ip
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list ip bans: {error}")))?;

        Ok(rows.into_iter().map(IpBan::from).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IpBanRow {
    ip: String,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<IpBanRow> for IpBan {
    fn from(row: IpBanRow) -> Self {
        Self {
            ip: row.ip,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}
