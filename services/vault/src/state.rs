use sea_orm::DatabaseConnection;

use crate::infra::captcha::InMemoryCaptchaStore;
use crate::infra::db::{
    DbFavoriteRepository, DbLogRepository, DbPermissionRepository, DbRoleRepository,
    DbUserRepository,
};
use crate::usecase::auth::TokenSettings;
use crate::usecase::tag::TagCache;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub token: TokenSettings,
    pub captcha: InMemoryCaptchaStore,
    pub tags: TagCache,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn permission_repo(&self) -> DbPermissionRepository {
        DbPermissionRepository {
            db: self.db.clone(),
        }
    }

    pub fn log_repo(&self) -> DbLogRepository {
        DbLogRepository {
            db: self.db.clone(),
        }
    }

    pub fn favorite_repo(&self) -> DbFavoriteRepository {
        DbFavoriteRepository {
            db: self.db.clone(),
        }
    }
}
