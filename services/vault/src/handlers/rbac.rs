use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::domain::rbac::Principal;
use crate::domain::types::{Permission, RoleWithPermissions};
use crate::error::VaultError;
use crate::handlers::json::JsonBody;
use crate::handlers::admin::MessageResponse;
use crate::state::AppState;
use crate::usecase::rbac::{
    CreateRoleInput, CreateRoleUseCase, DeleteRoleUseCase, GetRoleUseCase,
    ListPermissionsUseCase, ListRolesUseCase, UpdateRoleInput, UpdateRoleUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PermissionResponse {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            id: p.id,
            name: p.name,
            display_name: p.display_name,
            description: p.description,
            category: p.category,
        }
    }
}

#[derive(Serialize)]
pub struct RoleResponse {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system: bool,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub permissions: Vec<String>,
}

impl From<RoleWithPermissions> for RoleResponse {
    fn from(r: RoleWithPermissions) -> Self {
        let permissions = r.permission_names();
        Self {
            id: r.role.id,
            name: r.role.name,
            display_name: r.role.display_name,
            description: r.role.description,
            is_system: r.role.is_system,
            created_at: r.role.created_at,
            updated_at: r.role.updated_at,
            permissions,
        }
    }
}

// ── GET /api/rbac/permissions ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct PermissionListQuery {
    pub category: Option<String>,
}

pub async fn list_permissions(
    principal: Principal,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<PermissionResponse>>, VaultError> {
    let query: PermissionListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| VaultError::MissingData)?
        .unwrap_or_default();

    let usecase = ListPermissionsUseCase {
        permissions: state.permission_repo(),
    };
    let permissions = usecase
        .execute(&principal, query.category.as_deref())
        .await?;
    Ok(Json(
        permissions.into_iter().map(PermissionResponse::from).collect(),
    ))
}

// ── GET /api/rbac/roles ──────────────────────────────────────────────────────

pub async fn list_roles(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, VaultError> {
    let usecase = ListRolesUseCase {
        roles: state.role_repo(),
    };
    let roles = usecase.execute(&principal).await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

// ── GET /api/rbac/roles/{id} ─────────────────────────────────────────────────

pub async fn get_role(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RoleResponse>, VaultError> {
    let usecase = GetRoleUseCase {
        roles: state.role_repo(),
    };
    let role = usecase.execute(&principal, id).await?;
    Ok(Json(role.into()))
}

// ── POST /api/rbac/roles ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_names: Vec<String>,
}

pub async fn create_role(
    principal: Principal,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), VaultError> {
    let usecase = CreateRoleUseCase {
        roles: state.role_repo(),
        permissions: state.permission_repo(),
    };
    let role = usecase
        .execute(
            &principal,
            CreateRoleInput {
                name: body.name,
                display_name: body.display_name,
                description: body.description,
                permission_names: body.permission_names,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

// ── PUT /api/rbac/roles/{id} ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_names: Option<Vec<String>>,
}

pub async fn update_role(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(body): JsonBody<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, VaultError> {
    let usecase = UpdateRoleUseCase {
        roles: state.role_repo(),
        permissions: state.permission_repo(),
    };
    let role = usecase
        .execute(
            &principal,
            id,
            UpdateRoleInput {
                display_name: body.display_name,
                description: body.description,
                permission_names: body.permission_names,
            },
        )
        .await?;
    Ok(Json(role.into()))
}

// ── DELETE /api/rbac/roles/{id} ──────────────────────────────────────────────

pub async fn delete_role(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, VaultError> {
    let usecase = DeleteRoleUseCase {
        roles: state.role_repo(),
    };
    usecase.execute(&principal, id).await?;
    Ok(Json(MessageResponse {
        message: "role deleted",
    }))
}
