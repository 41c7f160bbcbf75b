use tracing::info;

use vault_domain::catalog::{AssetType, LogType, parse_tags};
use vault_domain::pagination::{Page, PageRequest};
use vault_domain::rbac::permissions::{LOG_CREATE, LOG_DELETE, LOG_EDIT};

use crate::domain::rbac::Principal;
use crate::domain::repository::LogRepository;
use crate::domain::types::{
    GenLog, GenLogChanges, LogDetail, LogFilter, NewGenLog, NewLogAsset, NewOutputGroup,
    validate_file_key, validate_title,
};
use crate::error::VaultError;
use crate::usecase::tag::TagCache;

// ── ListLogs ─────────────────────────────────────────────────────────────────

pub struct ListLogsUseCase<L: LogRepository> {
    pub logs: L,
}

impl<L: LogRepository> ListLogsUseCase<L> {
    pub async fn execute(
        &self,
        filter: LogFilter,
        page: PageRequest,
    ) -> Result<Page<GenLog>, VaultError> {
        let page = page.clamped();
        let (logs, total) = self.logs.list(&filter, page).await?;
        Ok(Page::new(logs, total, page))
    }
}

// ── GetLog ───────────────────────────────────────────────────────────────────

pub struct GetLogUseCase<L: LogRepository> {
    pub logs: L,
}

impl<L: LogRepository> GetLogUseCase<L> {
    pub async fn execute(&self, id: i32) -> Result<LogDetail, VaultError> {
        self.logs
            .find_detail(id)
            .await?
            .ok_or(VaultError::LogNotFound)
    }
}

// ── CreateLog ────────────────────────────────────────────────────────────────

pub struct CreateLogInput {
    pub title: String,
    pub log_type: LogType,
    /// Comma-separated.
    pub tools: Option<String>,
    /// Comma-separated.
    pub models: Option<String>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: bool,
    /// Ignored for `txt2img` logs.
    pub input_assets: Vec<AssetInput>,
    pub output_assets: Vec<AssetInput>,
    pub output_groups: Vec<OutputGroupInput>,
}

/// An already-uploaded image to attach to a new log.
pub struct AssetInput {
    pub file_key: String,
    pub note: Option<String>,
}

pub struct OutputGroupInput {
    /// Comma-separated.
    pub tools: Option<String>,
    /// Comma-separated.
    pub models: Option<String>,
}

/// Number the assets in request order. Blank notes are dropped.
fn new_assets(
    inputs: Vec<AssetInput>,
    asset_type: AssetType,
) -> Result<Vec<NewLogAsset>, VaultError> {
    inputs
        .into_iter()
        .zip(0..)
        .map(|(input, sort_order)| {
            validate_file_key(&input.file_key)?;
            Ok(NewLogAsset {
                file_key: input.file_key.trim().to_owned(),
                asset_type,
                note: input.note.filter(|n| !n.trim().is_empty()),
                sort_order,
            })
        })
        .collect()
}

pub struct CreateLogUseCase<L: LogRepository> {
    pub logs: L,
    pub tags: TagCache,
}

impl<L: LogRepository> CreateLogUseCase<L> {
    pub async fn execute(
        &self,
        actor: &Principal,
        input: CreateLogInput,
    ) -> Result<GenLog, VaultError> {
        actor.require(LOG_CREATE)?;
        validate_title(&input.title)?;

        let mut assets = match input.log_type {
            LogType::Img2Img => new_assets(input.input_assets, AssetType::Input)?,
            LogType::Txt2Img => Vec::new(),
        };
        assets.extend(new_assets(input.output_assets, AssetType::Output)?);
        let output_groups = input
            .output_groups
            .into_iter()
            .zip(0..)
            .map(|(group, sort_order)| NewOutputGroup {
                tools: parse_tags(group.tools.as_deref()),
                models: parse_tags(group.models.as_deref()),
                sort_order,
            })
            .collect();

        let log = self
            .logs
            .create(&NewGenLog {
                title: input.title,
                log_type: input.log_type,
                tools: parse_tags(input.tools.as_deref()),
                models: parse_tags(input.models.as_deref()),
                prompt: input.prompt,
                params_note: input.params_note,
                comparison_group_id: input.comparison_group_id,
                is_nsfw: input.is_nsfw,
                assets,
                output_groups,
            })
            .await?;
        self.tags.invalidate();
        info!(actor_id = actor.id(), log_id = log.id, "log created");
        Ok(log)
    }
}

// ── UpdateLog ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateLogInput {
    pub title: Option<String>,
    pub log_type: Option<LogType>,
    /// Comma-separated; an empty string clears the tags.
    pub tools: Option<String>,
    pub models: Option<String>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: Option<bool>,
}

pub struct UpdateLogUseCase<L: LogRepository> {
    pub logs: L,
    pub tags: TagCache,
}

impl<L: LogRepository> UpdateLogUseCase<L> {
    pub async fn execute(
        &self,
        actor: &Principal,
        id: i32,
        input: UpdateLogInput,
    ) -> Result<GenLog, VaultError> {
        actor.require(LOG_EDIT)?;
        if let Some(ref title) = input.title {
            validate_title(title)?;
        }
        if self.logs.find_by_id(id).await?.is_none() {
            return Err(VaultError::LogNotFound);
        }
        let changes = GenLogChanges {
            title: input.title,
            log_type: input.log_type,
            tools: input.tools.as_deref().map(|raw| parse_tags(Some(raw))),
            models: input.models.as_deref().map(|raw| parse_tags(Some(raw))),
            prompt: input.prompt,
            params_note: input.params_note,
            comparison_group_id: input.comparison_group_id,
            is_nsfw: input.is_nsfw,
        };
        self.logs.update(id, &changes).await?;
        self.tags.invalidate();

        self.logs
            .find_by_id(id)
            .await?
            .ok_or(VaultError::LogNotFound)
    }
}

// ── DeleteLog ────────────────────────────────────────────────────────────────

pub struct DeleteLogUseCase<L: LogRepository> {
    pub logs: L,
    pub tags: TagCache,
}

impl<L: LogRepository> DeleteLogUseCase<L> {
    pub async fn execute(&self, actor: &Principal, id: i32) -> Result<(), VaultError> {
        actor.require(LOG_DELETE)?;
        if !self.logs.delete(id).await? {
            return Err(VaultError::LogNotFound);
        }
        self.tags.invalidate();
        info!(actor_id = actor.id(), log_id = id, "log deleted");
        Ok(())
    }
}
