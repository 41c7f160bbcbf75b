use sea_orm::Database;
use tracing::info;

use vault_core::tracing::init_tracing;
use vault_server::config::VaultConfig;
use vault_server::infra::captcha::InMemoryCaptchaStore;
use vault_server::router::build_router;
use vault_server::state::AppState;
use vault_server::usecase::auth::TokenSettings;
use vault_server::usecase::tag::TagCache;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = VaultConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        token: TokenSettings {
            secret: config.jwt_secret.clone(),
            ttl_secs: config.access_token_ttl_secs(),
        },
        captcha: InMemoryCaptchaStore::new(),
        tags: TagCache::new(config.catalog_cache_ttl),
    };

    let router = build_router(state, &config.cors_origins);
    let addr = format!("0.0.0.0:{}", config.vault_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("vault service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
