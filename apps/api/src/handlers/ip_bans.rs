use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use gatehouse_core::UserIdentity;
use tracing::info;

use crate::dto::{CreateIpBanRequest, IpBanResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/admin/ip-bans
pub async fn list_ip_bans_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<IpBanResponse>>> {
    let bans = state.ip_ban_service.list().await?;
    Ok(Json(bans.into_iter().map(IpBanResponse::from).collect()))
}

/// POST /api/admin/ip-bans
pub async fn create_ip_ban_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<CreateIpBanRequest>,
) -> ApiResult<StatusCode> {
    state
        .ip_ban_service
        .ban(&payload.ip, payload.reason.as_deref().unwrap_or_default())
        .await?;
    info!(admin = identity.username(), ip = %payload.ip, "admin created ip ban");

    Ok(StatusCode::CREATED)
}

/// DELETE /api/admin/ip-bans/{ip}
///
/// The in-memory attempt history is kept, so an address that keeps failing
/// after being unbanned is banned again at its next lockout.
pub async fn delete_ip_ban_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(ip): Path<String>,
) -> ApiResult<StatusCode> {
    state.ip_ban_service.lift(&ip).await?;
    info!(admin = identity.username(), %ip, "admin lifted ip ban");

    Ok(StatusCode::NO_CONTENT)
}
