use std::sync::Arc;

use gatehouse_application::IpBanRepository;
use gatehouse_core::AppError;
use gatehouse_infrastructure::{PostgresIpBanRepository, RedisIpBanRepository};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::BanStoreConfig;

pub fn build_ban_repository(
    config: &BanStoreConfig,
    pool: PgPool,
) -> Result<Arc<dyn IpBanRepository>, AppError> {
    match config {
        BanStoreConfig::Postgres => {
            info!("using postgres ip ban store");
            Ok(Arc::new(PostgresIpBanRepository::new(pool)))
        }
        BanStoreConfig::Redis { url, key_prefix } => {
            let client = redis::Client::open(url.as_str())
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            info!(%key_prefix, "using redis ip ban store");
            Ok(Arc::new(RedisIpBanRepository::new(
                client,
                key_prefix.as_str(),
            )))
        }
    }
}
