use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use gatehouse_core::{AppError, UserIdentity, UserRole};
use tower_sessions::Session;
use tracing::info;

use crate::auth::SESSION_USER_KEY;
use crate::client_ip::ClientIp;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the client address and rejects permanently banned addresses.
pub async fn reject_banned_clients(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let client_ip = state
        .client_ip_resolver
        .resolve(peer, request.headers());

    if state.ip_ban_service.is_banned(client_ip.as_str()).await? {
        info!(ip = client_ip.as_str(), "rejected request from banned address");
        return Err(AppError::Forbidden("access denied".to_owned()).into());
    }

    request.extensions_mut().insert::<ClientIp>(client_ip);
    Ok(next.run(request).await)
}

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Must run inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> ApiResult<Response> {
    let is_admin = request
        .extensions()
        .get::<UserIdentity>()
        .is_some_and(|identity| identity.has_role(UserRole::Admin));

    if !is_admin {
        return Err(AppError::Forbidden("administrator role required".to_owned()).into());
    }

    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url.as_str();
        if origin != allowed_origin && !referer.starts_with(allowed_origin) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::is_state_changing_method;

    #[test]
    fn only_mutating_methods_need_origin_checks() {
        assert!(is_state_changing_method(&Method::POST));
        assert!(is_state_changing_method(&Method::DELETE));
        assert!(!is_state_changing_method(&Method::GET));
        assert!(!is_state_changing_method(&Method::HEAD));
    }
}
