use axum::{Json, extract::State};

use vault_domain::catalog::TagKind;

use crate::error::VaultError;
use crate::state::AppState;
use crate::usecase::tag::{ListTagsUseCase, TagStats, TagStatsUseCase};

async fn list_tags(state: AppState, kind: TagKind) -> Result<Json<Vec<String>>, VaultError> {
    let usecase = ListTagsUseCase {
        logs: state.log_repo(),
        cache: state.tags.clone(),
    };
    Ok(Json(usecase.execute(kind).await?))
}

// ── GET /api/tags/tools ──────────────────────────────────────────────────────

pub async fn get_tools(State(state): State<AppState>) -> Result<Json<Vec<String>>, VaultError> {
    list_tags(state, TagKind::Tools).await
}

// ── GET /api/tags/models ─────────────────────────────────────────────────────

pub async fn get_models(State(state): State<AppState>) -> Result<Json<Vec<String>>, VaultError> {
    list_tags(state, TagKind::Models).await
}

// ── GET /api/tags/stats ──────────────────────────────────────────────────────

pub async fn get_tag_stats(State(state): State<AppState>) -> Result<Json<TagStats>, VaultError> {
    let usecase = TagStatsUseCase {
        logs: state.log_repo(),
        cache: state.tags.clone(),
    };
    Ok(Json(usecase.execute().await?))
}
