use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use vault_domain::catalog::{AssetType, LogType};
use vault_domain::pagination::{Page, PageRequest};

use crate::domain::rbac::Principal;
use crate::domain::types::{GenLog, LogAsset, LogDetail, LogFilter, OutputGroup};
use crate::error::VaultError;
use crate::handlers::json::JsonBody;
use crate::handlers::admin::MessageResponse;
use crate::state::AppState;
use crate::usecase::log::{
    AssetInput, CreateLogInput, CreateLogUseCase, DeleteLogUseCase, GetLogUseCase,
    ListLogsUseCase, OutputGroupInput, UpdateLogInput, UpdateLogUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LogResponse {
    pub id: i32,
    pub title: String,
    pub log_type: LogType,
    pub tools: Vec<String>,
    pub models: Vec<String>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: bool,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<GenLog> for LogResponse {
    fn from(log: GenLog) -> Self {
        Self {
            id: log.id,
            title: log.title,
            log_type: log.log_type,
            tools: log.tools,
            models: log.models,
            prompt: log.prompt,
            params_note: log.params_note,
            comparison_group_id: log.comparison_group_id,
            is_nsfw: log.is_nsfw,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct AssetResponse {
    pub id: i32,
    pub file_key: String,
    pub note: Option<String>,
    pub sort_order: i32,
}

impl From<&LogAsset> for AssetResponse {
    fn from(asset: &LogAsset) -> Self {
        Self {
            id: asset.id,
            file_key: asset.file_key.clone(),
            note: asset.note.clone(),
            sort_order: asset.sort_order,
        }
    }
}

#[derive(Serialize)]
pub struct OutputGroupResponse {
    pub id: i32,
    pub tools: Vec<String>,
    pub models: Vec<String>,
    pub sort_order: i32,
}

impl From<OutputGroup> for OutputGroupResponse {
    fn from(group: OutputGroup) -> Self {
        Self {
            id: group.id,
            tools: group.tools,
            models: group.models,
            sort_order: group.sort_order,
        }
    }
}

#[derive(Serialize)]
pub struct LogDetailResponse {
    #[serde(flatten)]
    pub log: LogResponse,
    pub input_assets: Vec<AssetResponse>,
    pub output_assets: Vec<AssetResponse>,
    pub output_groups: Vec<OutputGroupResponse>,
}

impl From<LogDetail> for LogDetailResponse {
    fn from(detail: LogDetail) -> Self {
        let input_assets: Vec<AssetResponse> =
            detail.assets_of(AssetType::Input).map(Into::into).collect();
        let output_assets: Vec<AssetResponse> =
            detail.assets_of(AssetType::Output).map(Into::into).collect();
        Self {
            log: detail.log.into(),
            input_assets,
            output_assets,
            output_groups: detail.output_groups.into_iter().map(Into::into).collect(),
        }
    }
}

// ── GET /api/logs ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct LogListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub log_type: Option<String>,
    pub tool: Option<String>,
    pub model: Option<String>,
}

pub async fn list_logs(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Page<LogResponse>>, VaultError> {
    let query: LogListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| VaultError::MissingData)?
        .unwrap_or_default();

    let log_type = match query.log_type.as_deref().filter(|t| !t.is_empty()) {
        Some(raw) => Some(
            raw.parse::<LogType>()
                .map_err(|e| VaultError::InvalidInput(e.to_string()))?,
        ),
        None => None,
    };
    let page = PageRequest {
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(20),
    };

    let usecase = ListLogsUseCase {
        logs: state.log_repo(),
    };
    let logs = usecase
        .execute(
            LogFilter {
                search: query.search,
                log_type,
                tool: query.tool,
                model: query.model,
            },
            page,
        )
        .await?;

    Ok(Json(logs.map(LogResponse::from)))
}

// ── GET /api/logs/{id} ───────────────────────────────────────────────────────

pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LogDetailResponse>, VaultError> {
    let usecase = GetLogUseCase {
        logs: state.log_repo(),
    };
    let detail = usecase.execute(id).await?;
    Ok(Json(detail.into()))
}

// ── POST /api/logs ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateLogRequest {
    pub title: String,
    pub log_type: LogType,
    /// Comma-separated.
    #[serde(default)]
    pub tools: Option<String>,
    /// Comma-separated.
    #[serde(default)]
    pub models: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub params_note: Option<String>,
    #[serde(default)]
    pub comparison_group_id: Option<i32>,
    #[serde(default)]
    pub is_nsfw: bool,
    /// Object-store keys of images already uploaded. Inputs only count for `img2img`.
    #[serde(default)]
    pub input_assets: Vec<AssetRequest>,
    #[serde(default)]
    pub output_assets: Vec<AssetRequest>,
    #[serde(default)]
    pub output_groups: Vec<OutputGroupRequest>,
}

#[derive(Deserialize)]
pub struct AssetRequest {
    pub file_key: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct OutputGroupRequest {
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub models: Option<String>,
}

fn asset_inputs(requests: Vec<AssetRequest>) -> Vec<AssetInput> {
    requests
        .into_iter()
        .map(|a| AssetInput {
            file_key: a.file_key,
            note: a.note,
        })
        .collect()
}

pub async fn create_log(
    principal: Principal,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateLogRequest>,
) -> Result<(StatusCode, Json<LogResponse>), VaultError> {
    let usecase = CreateLogUseCase {
        logs: state.log_repo(),
        tags: state.tags.clone(),
    };
    let log = usecase
        .execute(
            &principal,
            CreateLogInput {
                title: body.title,
                log_type: body.log_type,
                tools: body.tools,
                models: body.models,
                prompt: body.prompt,
                params_note: body.params_note,
                comparison_group_id: body.comparison_group_id,
                is_nsfw: body.is_nsfw,
                input_assets: asset_inputs(body.input_assets),
                output_assets: asset_inputs(body.output_assets),
                output_groups: body
                    .output_groups
                    .into_iter()
                    .map(|g| OutputGroupInput {
                        tools: g.tools,
                        models: g.models,
                    })
                    .collect(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(log.into())))
}

// ── PUT /api/logs/{id} ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateLogRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub log_type: Option<LogType>,
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub models: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub params_note: Option<String>,
    #[serde(default)]
    pub comparison_group_id: Option<i32>,
    #[serde(default)]
    pub is_nsfw: Option<bool>,
}

pub async fn update_log(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(body): JsonBody<UpdateLogRequest>,
) -> Result<Json<LogResponse>, VaultError> {
    let usecase = UpdateLogUseCase {
        logs: state.log_repo(),
        tags: state.tags.clone(),
    };
    let log = usecase
        .execute(
            &principal,
            id,
            UpdateLogInput {
                title: body.title,
                log_type: body.log_type,
                tools: body.tools,
                models: body.models,
                prompt: body.prompt,
                params_note: body.params_note,
                comparison_group_id: body.comparison_group_id,
                is_nsfw: body.is_nsfw,
            },
        )
        .await?;
    Ok(Json(log.into()))
}

// ── DELETE /api/logs/{id} ────────────────────────────────────────────────────

pub async fn delete_log(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, VaultError> {
    let usecase = DeleteLogUseCase {
        logs: state.log_repo(),
        tags: state.tags.clone(),
    };
    usecase.execute(&principal, id).await?;
    Ok(Json(MessageResponse {
        message: "log deleted",
    }))
}
