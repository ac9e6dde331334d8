use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use gatehouse_core::AppError;
use gatehouse_infrastructure::Argon2Cost;
use ipnet::IpNet;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOGIN_GUARD_IDLE_SECONDS: u64 = 24 * 60 * 60;

/// Where permanent address bans are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanStoreConfig {
    Postgres,
    Redis { url: String, key_prefix: String },
}

/// Opt-in eviction of idle login attempt records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginGuardSweepConfig {
    pub interval: Duration,
    pub max_idle: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub ban_store: BanStoreConfig,
    pub trusted_proxies: Vec<IpNet>,
    pub login_guard_sweep: Option<LoginGuardSweepConfig>,
    pub password_cost: Argon2Cost,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let ban_store = parse_ban_store(
            env::var("BAN_STORE")
                .unwrap_or_else(|_| "postgres".to_owned())
                .as_str(),
            env::var("REDIS_URL").ok(),
            env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "gatehouse".to_owned()),
        )?;

        let trusted_proxies =
            parse_trusted_proxies(env::var("TRUSTED_PROXIES").unwrap_or_default().as_str())?;

        let login_guard_sweep = parse_sweep(
            env::var("LOGIN_GUARD_SWEEP_INTERVAL_SECONDS").ok(),
            env::var("LOGIN_GUARD_IDLE_SECONDS").ok(),
        )?;

        let password_cost = parse_password_cost(
            env::var("PASSWORD_HASH_MEMORY_KIB").ok(),
            env::var("PASSWORD_HASH_ITERATIONS").ok(),
            env::var("PASSWORD_HASH_PARALLELISM").ok(),
        )?;

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            ban_store,
            trusted_proxies,
            login_guard_sweep,
            password_cost,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_ban_store(
    kind: &str,
    redis_url: Option<String>,
    key_prefix: String,
) -> Result<BanStoreConfig, AppError> {
    match kind {
        "postgres" => Ok(BanStoreConfig::Postgres),
        "redis" => {
            let url = redis_url
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    AppError::Validation("REDIS_URL is required when BAN_STORE=redis".to_owned())
                })?;
            Ok(BanStoreConfig::Redis { url, key_prefix })
        }
        other => Err(AppError::Validation(format!(
            "BAN_STORE must be either 'postgres' or 'redis', got '{other}'"
        ))),
    }
}

fn parse_trusted_proxies(value: &str) -> Result<Vec<IpNet>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            IpNet::from_str(entry)
                .or_else(|_| IpAddr::from_str(entry).map(IpNet::from))
                .map_err(|error| {
                    AppError::Validation(format!("invalid TRUSTED_PROXIES entry '{entry}': {error}"))
                })
        })
        .collect()
}

fn parse_sweep(
    interval_seconds: Option<String>,
    idle_seconds: Option<String>,
) -> Result<Option<LoginGuardSweepConfig>, AppError> {
    let Some(interval_seconds) = interval_seconds.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    let interval = parse_seconds("LOGIN_GUARD_SWEEP_INTERVAL_SECONDS", &interval_seconds)?;
    let max_idle = match idle_seconds.filter(|value| !value.trim().is_empty()) {
        Some(value) => parse_seconds("LOGIN_GUARD_IDLE_SECONDS", &value)?,
        None => Duration::from_secs(DEFAULT_LOGIN_GUARD_IDLE_SECONDS),
    };

    Ok(Some(LoginGuardSweepConfig { interval, max_idle }))
}

fn parse_password_cost(
    memory_kib: Option<String>,
    iterations: Option<String>,
    parallelism: Option<String>,
) -> Result<Argon2Cost, AppError> {
    let defaults = Argon2Cost::default();
    Ok(Argon2Cost {
        memory_kib: parse_u32_or("PASSWORD_HASH_MEMORY_KIB", memory_kib, defaults.memory_kib)?,
        iterations: parse_u32_or("PASSWORD_HASH_ITERATIONS", iterations, defaults.iterations)?,
        parallelism: parse_u32_or(
            "PASSWORD_HASH_PARALLELISM",
            parallelism,
            defaults.parallelism,
        )?,
    })
}

fn parse_u32_or(name: &str, value: Option<String>, default: u32) -> Result<u32, AppError> {
    match value.filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration, AppError> {
    let seconds = value
        .trim()
        .parse::<u64>()
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    if seconds == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}
