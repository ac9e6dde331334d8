//! Gatehouse API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod client_ip;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use gatehouse_application::{
    IpBanService, LoginAttemptGuard, PermanentBanStore, UserService,
};
use gatehouse_core::AppError;
use gatehouse_domain::LoginGuardPolicy;
use gatehouse_infrastructure::{Argon2PasswordHasher, PostgresUserRepository, SystemClock};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, LoginGuardSweepConfig};
use crate::client_ip::ClientIpResolver;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_layer =
        api_services::build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;

    let ban_repository = api_services::build_ban_repository(&config.ban_store, pool.clone())?;
    let ban_store: Arc<dyn PermanentBanStore> = ban_repository.clone();
    let login_guard = LoginAttemptGuard::new(
        LoginGuardPolicy::default(),
        ban_store,
        Arc::new(SystemClock),
    );

    if let Some(sweep) = config.login_guard_sweep {
        spawn_login_guard_sweep(login_guard.clone(), sweep)?;
    }

    let user_service = UserService::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::with_cost(config.password_cost)?),
        login_guard,
    );

    let app_state = AppState {
        user_service,
        ip_ban_service: IpBanService::new(ban_repository),
        client_ip_resolver: ClientIpResolver::new(config.trusted_proxies.clone()),
        frontend_url: config.frontend_url.clone(),
    };

    let app = api_router::build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "gatehouse-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn spawn_login_guard_sweep(
    login_guard: LoginAttemptGuard,
    sweep: LoginGuardSweepConfig,
) -> Result<(), AppError> {
    let max_idle = chrono::Duration::from_std(sweep.max_idle).map_err(|error| {
        AppError::Validation(format!("invalid LOGIN_GUARD_IDLE_SECONDS: {error}"))
    })?;

    info!(
        interval_secs = sweep.interval.as_secs(),
        max_idle_secs = sweep.max_idle.as_secs(),
        "login attempt sweep enabled"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep.interval);
        loop {
            ticker.tick().await;
            match login_guard.prune_idle(max_idle) {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "pruned idle login attempt records"),
                Err(error) => warn!(%error, "login attempt sweep failed"),
            }
        }
    });

    Ok(())
}
