use std::time::Duration;

use vault_domain::catalog::{AssetType, LogType, TagKind};
use vault_domain::pagination::PageRequest;
use vault_domain::rbac::permissions::LOG_CREATE;
use vault_domain::rbac::roles::{ADMIN, EDITOR, USER};
use vault_server::domain::types::LogFilter;
use vault_server::error::VaultError;
use vault_server::usecase::favorite::{
    AddFavoriteUseCase, CheckFavoriteUseCase, CountFavoritesUseCase, ListFavoritesUseCase,
    RemoveFavoriteUseCase,
};
use vault_server::usecase::log::{
    AssetInput, CreateLogInput, CreateLogUseCase, DeleteLogUseCase, GetLogUseCase,
    ListLogsUseCase, OutputGroupInput, UpdateLogInput, UpdateLogUseCase,
};
use vault_server::usecase::tag::{ListTagsUseCase, TagCache, TagStatsUseCase};

use crate::helpers::MemoryStore;

fn tag_cache() -> TagCache {
    TagCache::new(Duration::from_secs(300))
}

fn create_input(title: &str, tools: Option<&str>) -> CreateLogInput {
    CreateLogInput {
        title: title.to_owned(),
        log_type: LogType::Txt2Img,
        tools: tools.map(str::to_owned),
        models: None,
        prompt: Some("a lighthouse at dusk".to_owned()),
        params_note: None,
        comparison_group_id: None,
        is_nsfw: false,
        input_assets: vec![],
        output_assets: vec![],
        output_groups: vec![],
    }
}

fn asset(file_key: &str, note: Option<&str>) -> AssetInput {
    AssetInput {
        file_key: file_key.to_owned(),
        note: note.map(str::to_owned),
    }
}

// ── Logs ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_forbid_log_creation_for_baseline_user() {
    let store = MemoryStore::seeded();
    let bob = store.principal(store.add_user("bob", &[USER])).await;

    let result = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(&bob, create_input("dusk", None))
    .await;

    assert!(matches!(result, Err(VaultError::Forbidden(ref p)) if p == LOG_CREATE));
}

#[tokio::test]
async fn should_store_trimmed_tags() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;

    let log = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(&editor, create_input("dusk", Some(" ComfyUI , ,Forge")))
    .await
    .unwrap();

    assert_eq!(log.tools, vec!["ComfyUI".to_owned(), "Forge".to_owned()]);
    assert!(log.models.is_empty());
}

#[tokio::test]
async fn should_clear_tags_with_empty_string() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;
    let id = store.add_log("dusk", &["ComfyUI"], &["SDXL"]);

    let updated = UpdateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &editor,
        id,
        UpdateLogInput {
            tools: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(updated.tools.is_empty());
    assert_eq!(updated.models, vec!["SDXL".to_owned()]);
}

#[tokio::test]
async fn should_return_attachments_with_log_detail() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;

    let created = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &editor,
        CreateLogInput {
            log_type: LogType::Img2Img,
            comparison_group_id: Some(7),
            input_assets: vec![asset("in/sketch.png", Some("line art"))],
            output_assets: vec![asset("out/a.png", Some("  ")), asset(" out/b.png ", None)],
            output_groups: vec![
                OutputGroupInput {
                    tools: Some("ComfyUI".to_owned()),
                    models: Some("SDXL, Flux ".to_owned()),
                },
                OutputGroupInput {
                    tools: Some(" , ".to_owned()),
                    models: None,
                },
            ],
            ..create_input("sketch", None)
        },
    )
    .await
    .unwrap();

    let detail = GetLogUseCase {
        logs: store.clone(),
    }
    .execute(created.id)
    .await
    .unwrap();

    assert_eq!(detail.log.comparison_group_id, Some(7));
    let inputs: Vec<_> = detail.assets_of(AssetType::Input).collect();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].note.as_deref(), Some("line art"));
    let outputs: Vec<(&str, i32)> = detail
        .assets_of(AssetType::Output)
        .map(|a| (a.file_key.as_str(), a.sort_order))
        .collect();
    assert_eq!(outputs, vec![("out/a.png", 0), ("out/b.png", 1)]);
    assert!(detail.assets_of(AssetType::Output).all(|a| a.note.is_none()));
    assert_eq!(detail.output_groups.len(), 2);
    assert_eq!(detail.output_groups[0].models, vec!["SDXL", "Flux"]);
    assert!(detail.output_groups[1].tools.is_empty());
}

#[tokio::test]
async fn should_ignore_input_assets_for_txt2img() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;

    let created = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &editor,
        CreateLogInput {
            input_assets: vec![asset("in/ref.png", None)],
            output_assets: vec![asset("out/a.png", None)],
            ..create_input("dusk", None)
        },
    )
    .await
    .unwrap();

    let detail = GetLogUseCase {
        logs: store.clone(),
    }
    .execute(created.id)
    .await
    .unwrap();
    assert_eq!(detail.assets_of(AssetType::Input).count(), 0);
    assert_eq!(detail.assets_of(AssetType::Output).count(), 1);
}

#[tokio::test]
async fn should_reject_blank_file_key_without_creating_log() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;

    let result = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &editor,
        CreateLogInput {
            output_assets: vec![asset("out/a.png", None), asset("  ", None)],
            ..create_input("dusk", None)
        },
    )
    .await;

    assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    let page = ListLogsUseCase {
        logs: store.clone(),
    }
    .execute(LogFilter::default(), PageRequest::default())
    .await
    .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn should_drop_attachments_with_deleted_log() {
    let store = MemoryStore::seeded();
    let admin = store.principal(store.add_user("root", &[ADMIN])).await;
    let created = CreateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &admin,
        CreateLogInput {
            output_assets: vec![asset("out/a.png", None)],
            output_groups: vec![OutputGroupInput {
                tools: Some("Forge".to_owned()),
                models: None,
            }],
            ..create_input("dusk", None)
        },
    )
    .await
    .unwrap();
    assert_eq!(store.attachment_count(), 2);

    DeleteLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(&admin, created.id)
    .await
    .unwrap();

    assert_eq!(store.attachment_count(), 0);
    let detail = GetLogUseCase {
        logs: store.clone(),
    }
    .execute(created.id)
    .await;
    assert!(matches!(detail, Err(VaultError::LogNotFound)));
}

#[tokio::test]
async fn should_return_not_found_for_missing_log() {
    let store = MemoryStore::seeded();
    let admin = store.principal(store.add_user("root", &[ADMIN])).await;

    let update = UpdateLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(
        &admin,
        9999,
        UpdateLogInput {
            title: Some("x".to_owned()),
            ..Default::default()
        },
    )
    .await;
    let delete = DeleteLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(&admin, 9999)
    .await;

    assert!(matches!(update, Err(VaultError::LogNotFound)));
    assert!(matches!(delete, Err(VaultError::LogNotFound)));
}

#[tokio::test]
async fn should_filter_logs_by_tool_and_search() {
    let store = MemoryStore::seeded();
    store.add_log("Harbor at dusk", &["ComfyUI"], &["SDXL"]);
    store.add_log("Forest study", &["Forge"], &["SD15"]);
    store.add_log("Harbor at dawn", &["Forge"], &["SDXL"]);
    let usecase = ListLogsUseCase {
        logs: store.clone(),
    };

    let by_tool = usecase
        .execute(
            LogFilter {
                tool: Some("Forge".to_owned()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    let by_search = usecase
        .execute(
            LogFilter {
                search: Some("harbor".to_owned()),
                model: Some("SDXL".to_owned()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();

    assert_eq!(by_tool.total, 2);
    assert_eq!(by_search.total, 2);
}

// ── Tags ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_serve_tags_from_cache_until_a_log_changes() {
    let store = MemoryStore::seeded();
    let editor = store.principal(store.add_user("ed", &[EDITOR])).await;
    store.add_log("dusk", &["ComfyUI"], &[]);
    let cache = tag_cache();
    let tags = ListTagsUseCase {
        logs: store.clone(),
        cache: cache.clone(),
    };

    assert_eq!(tags.execute(TagKind::Tools).await.unwrap(), vec!["ComfyUI"]);
    assert_eq!(tags.execute(TagKind::Tools).await.unwrap(), vec!["ComfyUI"]);
    assert_eq!(store.tag_queries(), 1);

    CreateLogUseCase {
        logs: store.clone(),
        tags: cache.clone(),
    }
    .execute(&editor, create_input("dawn", Some("Forge")))
    .await
    .unwrap();

    assert_eq!(
        tags.execute(TagKind::Tools).await.unwrap(),
        vec!["ComfyUI", "Forge"]
    );
    assert_eq!(store.tag_queries(), 2);
}

#[tokio::test]
async fn should_not_cache_tags_read_across_an_invalidation() {
    let store = MemoryStore::seeded();
    store.add_log("dusk", &["ComfyUI"], &["SDXL"]);
    let cache = tag_cache();
    store.invalidate_during_tag_reads(cache.clone());
    let tags = ListTagsUseCase {
        logs: store.clone(),
        cache: cache.clone(),
    };
    let stats = TagStatsUseCase {
        logs: store.clone(),
        cache: cache.clone(),
    };

    tags.execute(TagKind::Tools).await.unwrap();
    tags.execute(TagKind::Tools).await.unwrap();
    assert_eq!(store.tag_queries(), 2);

    stats.execute().await.unwrap();
    stats.execute().await.unwrap();
    assert_eq!(store.tag_queries(), 6);
}

#[tokio::test]
async fn should_count_tag_usage() {
    let store = MemoryStore::seeded();
    store.add_log("a", &["ComfyUI", "Forge"], &["SDXL"]);
    store.add_log("b", &["ComfyUI"], &[]);

    let stats = TagStatsUseCase {
        logs: store.clone(),
        cache: tag_cache(),
    }
    .execute()
    .await
    .unwrap();

    assert_eq!(stats.tools.get("ComfyUI"), Some(&2));
    assert_eq!(stats.tools.get("Forge"), Some(&1));
    assert_eq!(stats.models.get("SDXL"), Some(&1));
}

#[tokio::test]
async fn should_return_empty_tags_without_logs() {
    let store = MemoryStore::seeded();

    let tools = ListTagsUseCase {
        logs: store.clone(),
        cache: tag_cache(),
    }
    .execute(TagKind::Models)
    .await
    .unwrap();

    assert!(tools.is_empty());
}

// ── Favorites ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_add_check_and_remove_favorite() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[USER]);
    let log = store.add_log("dusk", &[], &[]);
    let add = AddFavoriteUseCase {
        favorites: store.clone(),
        logs: store.clone(),
    };
    let check = CheckFavoriteUseCase {
        favorites: store.clone(),
    };
    let remove = RemoveFavoriteUseCase {
        favorites: store.clone(),
    };

    add.execute(bob, log).await.unwrap();
    assert!(check.execute(bob, log).await.unwrap());
    assert!(matches!(
        add.execute(bob, log).await,
        Err(VaultError::AlreadyFavorited)
    ));

    remove.execute(bob, log).await.unwrap();
    assert!(!check.execute(bob, log).await.unwrap());
    assert!(matches!(
        remove.execute(bob, log).await,
        Err(VaultError::FavoriteNotFound)
    ));
}

#[tokio::test]
async fn should_refuse_to_favorite_missing_log() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[USER]);

    let result = AddFavoriteUseCase {
        favorites: store.clone(),
        logs: store.clone(),
    }
    .execute(bob, 9999)
    .await;

    assert!(matches!(result, Err(VaultError::LogNotFound)));
}

#[tokio::test]
async fn should_list_and_count_only_own_favorites() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[USER]);
    let carol = store.add_user("carol", &[USER]);
    let first = store.add_log("first", &[], &[]);
    let second = store.add_log("second", &[], &[]);
    let add = AddFavoriteUseCase {
        favorites: store.clone(),
        logs: store.clone(),
    };
    add.execute(bob, first).await.unwrap();
    add.execute(bob, second).await.unwrap();
    add.execute(carol, first).await.unwrap();

    let page = ListFavoritesUseCase {
        favorites: store.clone(),
    }
    .execute(bob, PageRequest::default())
    .await
    .unwrap();
    let count = CountFavoritesUseCase {
        favorites: store.clone(),
    }
    .execute(bob)
    .await
    .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(count, 2);
    assert!(page.data.iter().all(|e| e.favorite.user_id == bob));
    let mut titles: Vec<&str> = page.data.iter().map(|e| e.log.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["first", "second"]);
}

#[tokio::test]
async fn should_drop_favorites_with_deleted_log() {
    let store = MemoryStore::seeded();
    let admin = store.principal(store.add_user("root", &[ADMIN])).await;
    let bob = store.add_user("bob", &[USER]);
    let log = store.add_log("dusk", &[], &[]);
    AddFavoriteUseCase {
        favorites: store.clone(),
        logs: store.clone(),
    }
    .execute(bob, log)
    .await
    .unwrap();

    DeleteLogUseCase {
        logs: store.clone(),
        tags: tag_cache(),
    }
    .execute(&admin, log)
    .await
    .unwrap();

    let count = CountFavoritesUseCase {
        favorites: store.clone(),
    }
    .execute(bob)
    .await
    .unwrap();
    assert_eq!(count, 0);
}
