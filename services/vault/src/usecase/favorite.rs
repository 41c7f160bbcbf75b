use vault_domain::pagination::{Page, PageRequest};

use crate::domain::repository::{FavoriteRepository, LogRepository};
use crate::domain::types::{Favorite, FavoriteEntry};
use crate::error::VaultError;

// ── AddFavorite ──────────────────────────────────────────────────────────────

pub struct AddFavoriteUseCase<F: FavoriteRepository, L: LogRepository> {
    pub favorites: F,
    pub logs: L,
}

impl<F: FavoriteRepository, L: LogRepository> AddFavoriteUseCase<F, L> {
    pub async fn execute(&self, user_id: i32, log_id: i32) -> Result<Favorite, VaultError> {
        if self.logs.find_by_id(log_id).await?.is_none() {
            return Err(VaultError::LogNotFound);
        }
        if self.favorites.exists(user_id, log_id).await? {
            return Err(VaultError::AlreadyFavorited);
        }
        self.favorites.create(user_id, log_id).await
    }
}

// ── RemoveFavorite ───────────────────────────────────────────────────────────

pub struct RemoveFavoriteUseCase<F: FavoriteRepository> {
    pub favorites: F,
}

impl<F: FavoriteRepository> RemoveFavoriteUseCase<F> {
    pub async fn execute(&self, user_id: i32, log_id: i32) -> Result<(), VaultError> {
        if !self.favorites.delete(user_id, log_id).await? {
            return Err(VaultError::FavoriteNotFound);
        }
        Ok(())
    }
}

// ── CheckFavorite ────────────────────────────────────────────────────────────

pub struct CheckFavoriteUseCase<F: FavoriteRepository> {
    pub favorites: F,
}

impl<F: FavoriteRepository> CheckFavoriteUseCase<F> {
    pub async fn execute(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError> {
        self.favorites.exists(user_id, log_id).await
    }
}

// ── ListFavorites ────────────────────────────────────────────────────────────

pub struct ListFavoritesUseCase<F: FavoriteRepository> {
    pub favorites: F,
}

impl<F: FavoriteRepository> ListFavoritesUseCase<F> {
    pub async fn execute(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<Page<FavoriteEntry>, VaultError> {
        let page = page.clamped();
        let (entries, total) = self.favorites.list(user_id, page).await?;
        Ok(Page::new(entries, total, page))
    }
}

// ── CountFavorites ───────────────────────────────────────────────────────────

pub struct CountFavoritesUseCase<F: FavoriteRepository> {
    pub favorites: F,
}

impl<F: FavoriteRepository> CountFavoritesUseCase<F> {
    pub async fn execute(&self, user_id: i32) -> Result<u64, VaultError> {
        self.favorites.count(user_id).await
    }
}
