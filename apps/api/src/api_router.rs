use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use gatehouse_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;


pub fn build_router<Store>(
    app_state: AppState,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let cors_layer = cors::build_cors_layer(&app_state.frontend_url)?;

    let admin_routes = Router::new()
        .route(
            "/api/admin/ip-bans",
            get(handlers::ip_bans::list_ip_bans_handler)
                .post(handlers::ip_bans::create_ip_ban_handler),
        )
        .route(
            "/api/admin/ip-bans/{ip}",
            delete(handlers::ip_bans::delete_ip_ban_handler),
        )
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn(middleware::require_auth));

    let session_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let client_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(session_routes)
        .merge(admin_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::reject_banned_clients,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(client_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
