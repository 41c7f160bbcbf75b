use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::rbac::Principal;
use crate::domain::types::UserAggregate;
use crate::error::VaultError;
use crate::handlers::json::JsonBody;
use crate::state::AppState;
use crate::usecase::auth::{
    AuthOutput, IssueCaptchaUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    #[serde(serialize_with = "vault_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserAggregate> for UserResponse {
    fn from(user: UserAggregate) -> Self {
        let roles = user.role_names();
        Self {
            id: user.user.id,
            username: user.user.username,
            email: user.user.email,
            roles,
            is_active: user.user.is_active,
            created_at: user.user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

impl From<AuthOutput> for TokenResponse {
    fn from(out: AuthOutput) -> Self {
        Self {
            access_token: out.access_token,
            token_type: "bearer",
            user: out.user.into(),
        }
    }
}

// ── GET /api/auth/captcha ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CaptchaResponse {
    pub captcha_id: String,
    pub question: String,
}

pub async fn get_captcha(State(state): State<AppState>) -> Json<CaptchaResponse> {
    let usecase = IssueCaptchaUseCase {
        captcha: state.captcha.clone(),
    };
    let captcha = usecase.execute();
    Json(CaptchaResponse {
        captcha_id: captcha.id,
        question: captcha.question,
    })
}

// ── POST /api/auth/register ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    pub captcha_id: String,
    pub captcha_answer: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), VaultError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
        captcha: state.captcha.clone(),
        token: state.token.clone(),
    };

    let out = usecase
        .execute(RegisterInput {
            username: body.username,
            password: body.password,
            email: body.email,
            captcha_id: body.captcha_id,
            captcha_answer: body.captcha_answer,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(out.into())))
}

// ── POST /api/auth/login ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha_id: String,
    pub captcha_answer: String,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, VaultError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        captcha: state.captcha.clone(),
        token: state.token.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            username: body.username,
            password: body.password,
            captcha_id: body.captcha_id,
            captcha_answer: body.captcha_answer,
        })
        .await?;

    Ok(Json(out.into()))
}

// ── GET /api/auth/me ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Resolved permission names, sorted.
    pub permissions: Vec<String>,
}

pub async fn get_me(principal: Principal) -> Json<MeResponse> {
    let mut permissions: Vec<String> = principal.permissions.into_iter().collect();
    permissions.sort();
    Json(MeResponse {
        user: principal.user.into(),
        permissions,
    })
}
