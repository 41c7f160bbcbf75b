use axum::extract::rejection::JsonRejection;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Vault service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    // ── Not found ────────────────────────────────────────────────────────────
    #[error("user not found")]
    UserNotFound,
    #[error("role not found")]
    RoleNotFound,
    #[error("log not found")]
    LogNotFound,
    #[error("favorite not found")]
    FavoriteNotFound,
    /// A name inside a batch request did not resolve; carries the first missing name.
    #[error("role not found: {0}")]
    UnknownRole(String),
    #[error("permission not found: {0}")]
    UnknownPermission(String),

    // ── Conflict ─────────────────────────────────────────────────────────────
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("role name already exists")]
    RoleNameTaken,
    #[error("role already assigned")]
    RoleAlreadyAssigned,
    #[error("log already favorited")]
    AlreadyFavorited,
    #[error("role is assigned to {0} users")]
    RoleInUse(u64),

    // ── Invalid operation ────────────────────────────────────────────────────
    #[error("cannot modify own role or status")]
    SelfModification,
    #[error("cannot delete own account")]
    SelfDeletion,
    #[error("system roles cannot be modified or deleted")]
    SystemRole,

    // ── Bad request ──────────────────────────────────────────────────────────
    #[error("invalid or expired captcha")]
    InvalidCaptcha,
    #[error("{0}")]
    InvalidInput(String),
    #[error("missing data")]
    MissingData,

    // ── Authentication / authorization ───────────────────────────────────────
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user is disabled")]
    UserDisabled,
    #[error("requires permission: {0}")]
    Forbidden(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl VaultError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::LogNotFound => "LOG_NOT_FOUND",
            Self::FavoriteNotFound => "FAVORITE_NOT_FOUND",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
            Self::UnknownPermission(_) => "UNKNOWN_PERMISSION",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::RoleNameTaken => "ROLE_NAME_TAKEN",
            Self::RoleAlreadyAssigned => "ROLE_ALREADY_ASSIGNED",
            Self::AlreadyFavorited => "ALREADY_FAVORITED",
            Self::RoleInUse(_) => "ROLE_IN_USE",
            Self::SelfModification => "SELF_MODIFICATION",
            Self::SelfDeletion => "SELF_DELETION",
            Self::SystemRole => "SYSTEM_ROLE",
            Self::InvalidCaptcha => "INVALID_CAPTCHA",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MissingData => "MISSING_DATA",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserDisabled => "USER_DISABLED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound | Self::RoleNotFound | Self::LogNotFound | Self::FavoriteNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::UnknownRole(_)
            | Self::UnknownPermission(_)
            | Self::UsernameTaken
            | Self::EmailTaken
            | Self::RoleNameTaken
            | Self::RoleAlreadyAssigned
            | Self::AlreadyFavorited
            | Self::RoleInUse(_)
            | Self::SelfModification
            | Self::SelfDeletion
            | Self::SystemRole
            | Self::InvalidCaptcha
            | Self::InvalidInput(_)
            | Self::MissingData => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserDisabled | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for VaultError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer records every request; only 500s carry a chain worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
