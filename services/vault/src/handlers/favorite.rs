use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use vault_domain::catalog::LogType;
use vault_domain::pagination::{Page, PageRequest};

use crate::domain::rbac::Principal;
use crate::domain::types::FavoriteEntry;
use crate::error::VaultError;
use crate::handlers::admin::MessageResponse;
use crate::state::AppState;
use crate::usecase::favorite::{
    AddFavoriteUseCase, CheckFavoriteUseCase, CountFavoritesUseCase, ListFavoritesUseCase,
    RemoveFavoriteUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FavoriteLogSummary {
    pub id: i32,
    pub title: String,
    pub log_type: LogType,
    pub tools: Vec<String>,
    pub models: Vec<String>,
    pub prompt: Option<String>,
    pub is_nsfw: bool,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct FavoriteResponse {
    pub id: i32,
    pub log_id: i32,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub log: FavoriteLogSummary,
}

impl From<FavoriteEntry> for FavoriteResponse {
    fn from(entry: FavoriteEntry) -> Self {
        let log = entry.log;
        Self {
            id: entry.favorite.id,
            log_id: entry.favorite.log_id,
            created_at: entry.favorite.created_at,
            log: FavoriteLogSummary {
                id: log.id,
                title: log.title,
                log_type: log.log_type,
                tools: log.tools,
                models: log.models,
                prompt: log.prompt,
                is_nsfw: log.is_nsfw,
                created_at: log.created_at,
            },
        }
    }
}

// ── POST /api/favorites/{log_id} ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct FavoriteCreatedResponse {
    pub message: &'static str,
    pub id: i32,
}

pub async fn add_favorite(
    principal: Principal,
    State(state): State<AppState>,
    Path(log_id): Path<i32>,
) -> Result<(StatusCode, Json<FavoriteCreatedResponse>), VaultError> {
    let usecase = AddFavoriteUseCase {
        favorites: state.favorite_repo(),
        logs: state.log_repo(),
    };
    let favorite = usecase.execute(principal.id(), log_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(FavoriteCreatedResponse {
            message: "favorited",
            id: favorite.id,
        }),
    ))
}

// ── DELETE /api/favorites/{log_id} ───────────────────────────────────────────

pub async fn remove_favorite(
    principal: Principal,
    State(state): State<AppState>,
    Path(log_id): Path<i32>,
) -> Result<Json<MessageResponse>, VaultError> {
    let usecase = RemoveFavoriteUseCase {
        favorites: state.favorite_repo(),
    };
    usecase.execute(principal.id(), log_id).await?;
    Ok(Json(MessageResponse {
        message: "favorite removed",
    }))
}

// ── GET /api/favorites/check/{log_id} ────────────────────────────────────────

#[derive(Serialize)]
pub struct CheckFavoriteResponse {
    pub is_favorited: bool,
}

pub async fn check_favorite(
    principal: Principal,
    State(state): State<AppState>,
    Path(log_id): Path<i32>,
) -> Result<Json<CheckFavoriteResponse>, VaultError> {
    let usecase = CheckFavoriteUseCase {
        favorites: state.favorite_repo(),
    };
    let is_favorited = usecase.execute(principal.id(), log_id).await?;
    Ok(Json(CheckFavoriteResponse { is_favorited }))
}

// ── GET /api/favorites ───────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct FavoriteListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_favorites(
    principal: Principal,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Page<FavoriteResponse>>, VaultError> {
    let query: FavoriteListQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| VaultError::MissingData)?
        .unwrap_or_default();

    let usecase = ListFavoritesUseCase {
        favorites: state.favorite_repo(),
    };
    let favorites = usecase
        .execute(
            principal.id(),
            PageRequest {
                page: query.page.unwrap_or(1),
                page_size: query.page_size.unwrap_or(20),
            },
        )
        .await?;
    Ok(Json(favorites.map(FavoriteResponse::from)))
}

// ── GET /api/favorites/count ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn count_favorites(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, VaultError> {
    let usecase = CountFavoritesUseCase {
        favorites: state.favorite_repo(),
    };
    let count = usecase.execute(principal.id()).await?;
    Ok(Json(CountResponse { count }))
}
