use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::{Deserialize, Serialize};

use vault_domain::pagination::{Page, PageRequest};

use crate::domain::rbac::Principal;
use crate::domain::types::UserFilter;
use crate::error::VaultError;
use crate::handlers::json::JsonBody;
use crate::handlers::auth::UserResponse;
use crate::state::AppState;
use crate::usecase::admin::{
    DeleteUserUseCase, GetUserUseCase, ListUsersUseCase, UpdateUserInput, UpdateUserUseCase,
    UserStatsUseCase,
};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── GET /api/admin/users ─────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
}

pub async fn list_users(
    principal: Principal,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Page<UserResponse>>, VaultError> {
    let query: UserListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| VaultError::MissingData)?
        .unwrap_or_default();

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(20),
    };
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase
        .execute(
            &principal,
            UserFilter {
                search: query.search,
                role: query.role,
            },
            page,
        )
        .await?;

    Ok(Json(users.map(UserResponse::from)))
}

// ── GET /api/admin/users/{id} ────────────────────────────────────────────────

pub async fn get_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, VaultError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(&principal, id).await?;
    Ok(Json(user.into()))
}

// ── PATCH /api/admin/users/{id} ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub role_names: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub async fn update_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, VaultError> {
    let usecase = UpdateUserUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
    };
    let user = usecase
        .execute(
            &principal,
            id,
            UpdateUserInput {
                role_names: body.role_names,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── DELETE /api/admin/users/{id} ─────────────────────────────────────────────

pub async fn delete_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, VaultError> {
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&principal, id).await?;
    Ok(Json(MessageResponse {
        message: "user deleted",
    }))
}

// ── GET /api/admin/stats ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    pub role_counts: BTreeMap<String, u64>,
}

pub async fn get_stats(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, VaultError> {
    let usecase = UserStatsUseCase {
        users: state.user_repo(),
    };
    let stats = usecase.execute(&principal).await?;
    Ok(Json(StatsResponse {
        total_users: stats.total_users,
        active_users: stats.active_users,
        inactive_users: stats.total_users.saturating_sub(stats.active_users),
        role_counts: stats.role_counts.into_iter().collect(),
    }))
}
