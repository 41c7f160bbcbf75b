use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use vault_core::cache::TtlCache;
use vault_domain::catalog::TagKind;

use crate::domain::repository::LogRepository;
use crate::error::VaultError;

/// Key prefix shared by every cached tag aggregate.
pub const TAG_CACHE_PREFIX: &str = "tags:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagStats {
    pub tools: BTreeMap<String, u64>,
    pub models: BTreeMap<String, u64>,
}

/// Cached tag aggregates. Any log mutation must call [`TagCache::invalidate`].
///
/// A value computed from a read that overlapped an invalidation is never
/// stored: fills carry the generation seen before the read and are dropped
/// if it moved.
#[derive(Clone)]
pub struct TagCache {
    names: TtlCache<Vec<String>>,
    stats: TtlCache<TagStats>,
    ttl: Duration,
    generation: Arc<Mutex<u64>>,
}

impl TagCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            names: TtlCache::new(),
            stats: TtlCache::new(),
            ttl,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn invalidate(&self) {
        let mut generation = self.lock_generation();
        *generation = generation.wrapping_add(1);
        self.names.invalidate(TAG_CACHE_PREFIX);
        self.stats.invalidate(TAG_CACHE_PREFIX);
    }

    fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    fn fill<V: Clone>(&self, cache: &TtlCache<V>, key: String, value: V, seen: u64) {
        let generation = self.lock_generation();
        if *generation == seen {
            cache.set(key, value, self.ttl);
        }
    }
}

fn names_key(kind: TagKind) -> String {
    format!("{TAG_CACHE_PREFIX}{}", kind.as_str())
}

// ── ListTags ─────────────────────────────────────────────────────────────────

pub struct ListTagsUseCase<L: LogRepository> {
    pub logs: L,
    pub cache: TagCache,
}

impl<L: LogRepository> ListTagsUseCase<L> {
    pub async fn execute(&self, kind: TagKind) -> Result<Vec<String>, VaultError> {
        let key = names_key(kind);
        if let Some(hit) = self.cache.names.get(&key) {
            return Ok(hit);
        }
        let seen = self.cache.generation();
        let names = self.logs.distinct_tags(kind).await?;
        self.cache.fill(&self.cache.names, key, names.clone(), seen);
        Ok(names)
    }
}

// ── TagStats ─────────────────────────────────────────────────────────────────

pub struct TagStatsUseCase<L: LogRepository> {
    pub logs: L,
    pub cache: TagCache,
}

impl<L: LogRepository> TagStatsUseCase<L> {
    pub async fn execute(&self) -> Result<TagStats, VaultError> {
        let key = format!("{TAG_CACHE_PREFIX}stats");
        if let Some(hit) = self.cache.stats.get(&key) {
            return Ok(hit);
        }
        let seen = self.cache.generation();
        let stats = TagStats {
            tools: self.logs.tag_counts(TagKind::Tools).await?.into_iter().collect(),
            models: self.logs.tag_counts(TagKind::Models).await?.into_iter().collect(),
        };
        self.cache.fill(&self.cache.stats, key, stats.clone(), seen);
        Ok(stats)
    }
}
