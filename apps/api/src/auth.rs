use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use gatehouse_application::AuthOutcome;
use gatehouse_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::client_ip::ClientIp;
use crate::dto::{LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// POST /auth/login - Authenticate with username+password.
pub async fn login_handler(
    State(state): State<AppState>,
    Extension(client_ip): Extension<ClientIp>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let outcome = state
        .user_service
        .login(&payload.username, &payload.password, client_ip.as_str())
        .await?;

    match outcome {
        AuthOutcome::Authenticated(user) => {
            let identity = user.identity();

            session.cycle_id().await.map_err(|error| {
                AppError::Internal(format!("failed to cycle session id: {error}"))
            })?;
            session
                .insert(SESSION_USER_KEY, &identity)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist session identity: {error}"))
                })?;

            Ok(Json(UserIdentityResponse::from(&identity)))
        }
        // Same message for fresh and ongoing lockouts, and no remaining time.
        AuthOutcome::Throttled => Err(AppError::RateLimited(
            "too many login attempts, please try again later".to_owned(),
        )
        .into()),
        AuthOutcome::Failed => {
            Err(AppError::Unauthorized("invalid credentials".to_owned()).into())
        }
    }
}

/// POST /auth/logout
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me_handler(
    Extension(identity): Extension<UserIdentity>,
) -> Json<UserIdentityResponse> {
    Json(UserIdentityResponse::from(&identity))
}
