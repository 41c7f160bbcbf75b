use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{MethodRouter, delete, get, patch, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use vault_core::health::healthz;
use vault_core::middleware::{propagate_request_id_layer, request_id_layer};
use vault_domain::rbac::permissions::{
    LOG_CREATE, LOG_DELETE, LOG_EDIT, ROLE_CREATE, ROLE_DELETE, ROLE_EDIT, ROLE_VIEW,
    USER_DELETE, USER_EDIT, USER_VIEW,
};

use crate::auth::require_permission;
use crate::handlers::{
    admin::{delete_user, get_stats, get_user, list_users, update_user},
    auth::{get_captcha, get_me, login, register},
    favorite::{add_favorite, check_favorite, count_favorites, list_favorites, remove_favorite},
    health::readyz,
    log::{create_log, delete_log, get_log, list_logs, update_log},
    rbac::{create_role, delete_role, get_role, list_permissions, list_roles, update_role},
    tag::{get_models, get_tag_stats, get_tools},
};
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let guarded = |route: MethodRouter<AppState>, permission: &'static str| {
        require_permission(route, &state, permission)
    };

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/api/auth/captcha", get(get_captcha))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(get_me))
        // Admin
        .route("/api/admin/users", guarded(get(list_users), USER_VIEW))
        .route(
            "/api/admin/users/{id}",
            guarded(get(get_user), USER_VIEW)
                .merge(guarded(patch(update_user), USER_EDIT))
                .merge(guarded(delete(delete_user), USER_DELETE)),
        )
        .route("/api/admin/stats", guarded(get(get_stats), USER_VIEW))
        // RBAC
        .route(
            "/api/rbac/permissions",
            guarded(get(list_permissions), ROLE_VIEW),
        )
        .route(
            "/api/rbac/roles",
            guarded(get(list_roles), ROLE_VIEW).merge(guarded(post(create_role), ROLE_CREATE)),
        )
        .route(
            "/api/rbac/roles/{id}",
            guarded(get(get_role), ROLE_VIEW)
                .merge(guarded(put(update_role), ROLE_EDIT))
                .merge(guarded(delete(delete_role), ROLE_DELETE)),
        )
        // Catalog
        .route(
            "/api/logs",
            get(list_logs).merge(guarded(post(create_log), LOG_CREATE)),
        )
        .route(
            "/api/logs/{id}",
            get(get_log)
                .merge(guarded(put(update_log), LOG_EDIT))
                .merge(guarded(delete(delete_log), LOG_DELETE)),
        )
        .route("/api/tags/tools", get(get_tools))
        .route("/api/tags/models", get(get_models))
        .route("/api/tags/stats", get(get_tag_stats))
        // Favorites
        .route("/api/favorites", get(list_favorites))
        .route("/api/favorites/count", get(count_favorites))
        .route("/api/favorites/check/{log_id}", get(check_favorite))
        .route(
            "/api/favorites/{log_id}",
            post(add_favorite).delete(remove_favorite),
        )
        .with_state(state.clone())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
}
