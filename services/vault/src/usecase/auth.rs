use anyhow::Context as _;
use tracing::{info, warn};

use vault_auth_types::password::{hash_password, verify_password};
use vault_auth_types::token::{issue_access_token, validate_access_token};
use vault_domain::rbac::DEFAULT_ROLE;

use crate::domain::rbac::Principal;
use crate::domain::repository::{Captcha, CaptchaStore, RoleRepository, UserRepository};
use crate::domain::types::{NewUser, UserAggregate, validate_password, validate_username};
use crate::error::VaultError;

/// Signing secret and lifetime of issued access tokens.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl_secs: u64,
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthOutput {
    pub access_token: String,
    pub user: UserAggregate,
}

fn issue_for(user: UserAggregate, token: &TokenSettings) -> Result<AuthOutput, VaultError> {
    let (access_token, _exp) = issue_access_token(user.user.id, &token.secret, token.ttl_secs)
        .context("issue access token")?;
    Ok(AuthOutput { access_token, user })
}

// ── IssueCaptcha ─────────────────────────────────────────────────────────────

pub struct IssueCaptchaUseCase<C: CaptchaStore> {
    pub captcha: C,
}

impl<C: CaptchaStore> IssueCaptchaUseCase<C> {
    pub fn execute(&self) -> Captcha {
        self.captcha.issue()
    }
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub captcha_id: String,
    pub captcha_answer: String,
}

pub struct RegisterUseCase<U: UserRepository, R: RoleRepository, C: CaptchaStore> {
    pub users: U,
    pub roles: R,
    pub captcha: C,
    pub token: TokenSettings,
}

impl<U: UserRepository, R: RoleRepository, C: CaptchaStore> RegisterUseCase<U, R, C> {
    pub async fn execute(&self, input: RegisterInput) -> Result<AuthOutput, VaultError> {
        if !self.captcha.verify(&input.captcha_id, &input.captcha_answer) {
            return Err(VaultError::InvalidCaptcha);
        }
        validate_username(&input.username)?;
        validate_password(&input.password)?;
        let email = input
            .email
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        if self.users.username_exists(&input.username).await? {
            return Err(VaultError::UsernameTaken);
        }
        if let Some(ref email) = email {
            if self.users.email_exists(email).await? {
                return Err(VaultError::EmailTaken);
            }
        }

        let hashed_password = hash_password(&input.password).context("hash password")?;
        let default_role = self.roles.find_by_name(DEFAULT_ROLE).await?;
        if default_role.is_none() {
            warn!(role = DEFAULT_ROLE, "default role missing, registering without roles");
        }
        let role_ids: Vec<i32> = default_role.iter().map(|r| r.id).collect();

        let user = self
            .users
            .create(
                &NewUser {
                    username: input.username,
                    email,
                    hashed_password,
                },
                &role_ids,
            )
            .await?;
        info!(user_id = user.id, "user registered");

        let aggregate = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or(VaultError::UserNotFound)?;
        issue_for(aggregate, &self.token)
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub captcha_id: String,
    pub captcha_answer: String,
}

pub struct LoginUseCase<U: UserRepository, C: CaptchaStore> {
    pub users: U,
    pub captcha: C,
    pub token: TokenSettings,
}

impl<U: UserRepository, C: CaptchaStore> LoginUseCase<U, C> {
    pub async fn execute(&self, input: LoginInput) -> Result<AuthOutput, VaultError> {
        if !self.captcha.verify(&input.captcha_id, &input.captcha_answer) {
            return Err(VaultError::InvalidCaptcha);
        }
        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or(VaultError::InvalidCredentials)?;
        if !verify_password(&input.password, &user.user.hashed_password) {
            return Err(VaultError::InvalidCredentials);
        }
        if !user.user.is_active {
            return Err(VaultError::UserDisabled);
        }
        issue_for(user, &self.token)
    }
}

// ── Authenticate ─────────────────────────────────────────────────────────────

/// Turn a bearer token into a [`Principal`].
///
/// Invalid tokens and tokens of deleted users are unauthenticated; tokens of
/// disabled users are forbidden.
pub struct AuthenticateUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> AuthenticateUseCase<U> {
    pub async fn execute(&self, token: &str) -> Result<Principal, VaultError> {
        let info = validate_access_token(token, &self.jwt_secret).map_err(|e| {
            tracing::debug!(reason = %e, "rejected bearer token");
            VaultError::InvalidToken
        })?;
        let user = self
            .users
            .find_by_id(info.user_id)
            .await?
            .ok_or(VaultError::InvalidToken)?;
        if !user.user.is_active {
            warn!(user_id = info.user_id, "disabled user presented a token");
            return Err(VaultError::UserDisabled);
        }
        Ok(Principal::new(user))
    }
}
