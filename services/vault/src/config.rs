use std::time::Duration;

/// Vault service configuration loaded from environment variables.
#[derive(Debug)]
pub struct VaultConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 8000). Env var: `VAULT_PORT`.
    pub vault_port: u16,
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Access token lifetime (default 1440). Env var: `JWT_ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub access_token_expire_minutes: u64,
    /// Allowed browser origins. Env var: `CORS_ORIGINS`, comma separated.
    pub cors_origins: Vec<String>,
    /// Lifetime of cached tag aggregates (default 300). Env var: `CATALOG_CACHE_TTL_SECS`.
    pub catalog_cache_ttl: Duration,
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect()
}

impl VaultConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            vault_port: std::env::var("VAULT_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            access_token_expire_minutes: std::env::var("JWT_ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1440),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_owned()),
            ),
            catalog_cache_ttl: Duration::from_secs(
                std::env::var("CATALOG_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }

    pub fn access_token_ttl_secs(&self) -> u64 {
        self.access_token_expire_minutes.saturating_mul(60)
    }
}
