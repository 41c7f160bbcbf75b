use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use vault_auth_types::password::hash_password;
use vault_domain::catalog::{LogType, TagKind};
use vault_domain::pagination::PageRequest;
use vault_domain::rbac::{BUILTIN_PERMISSIONS, BUILTIN_ROLES};
use vault_server::domain::rbac::Principal;
use vault_server::domain::repository::{
    Captcha, CaptchaStore, FavoriteRepository, LogRepository, PermissionRepository,
    RoleRepository, UserRepository,
};
use vault_server::domain::types::{
    Favorite, FavoriteEntry, GenLog, GenLogChanges, LogAsset, LogDetail, LogFilter, NewGenLog,
    NewRole, NewUser, OutputGroup, Permission, Role, RoleChanges, RoleWithPermissions, User,
    UserAggregate, UserChanges, UserFilter, UserStats,
};
use vault_server::error::VaultError;
use vault_server::usecase::auth::TokenSettings;
use vault_server::usecase::tag::TagCache;

pub use vault_testing::auth::TEST_JWT_SECRET;

pub const CAPTCHA_ID: &str = "captcha-1";
pub const CAPTCHA_ANSWER: &str = "42";

pub fn token_settings() -> TokenSettings {
    TokenSettings {
        secret: TEST_JWT_SECRET.to_owned(),
        ttl_secs: 3600,
    }
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Graph {
    next_id: i32,
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: Vec<(i32, i32)>,
    role_permissions: Vec<(i32, i32)>,
    logs: Vec<GenLog>,
    assets: Vec<LogAsset>,
    output_groups: Vec<OutputGroup>,
    favorites: Vec<Favorite>,
}

impl Graph {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn role_aggregate(&self, role: &Role) -> RoleWithPermissions {
        let mut permissions: Vec<Permission> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role.id)
            .filter_map(|(_, p)| self.permissions.iter().find(|x| x.id == *p).cloned())
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        RoleWithPermissions {
            role: role.clone(),
            permissions,
        }
    }

    fn user_aggregate(&self, user: &User) -> UserAggregate {
        let roles = self
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user.id)
            .filter_map(|(_, r)| self.roles.iter().find(|x| x.id == *r))
            .map(|r| self.role_aggregate(r))
            .collect();
        UserAggregate {
            user: user.clone(),
            roles,
        }
    }

    fn holders(&self, role_id: i32) -> u64 {
        self.user_roles.iter().filter(|(_, r)| *r == role_id).count() as u64
    }

    fn insert_role(&mut self, name: &str, is_system: bool, permission_names: &[&str]) -> i32 {
        let id = self.next_id();
        let now = Utc::now();
        self.roles.push(Role {
            id,
            name: name.to_owned(),
            display_name: name.to_owned(),
            description: None,
            is_system,
            created_at: now,
            updated_at: now,
        });
        for permission in permission_names {
            let pid = self
                .permissions
                .iter()
                .find(|p| p.name == *permission)
                .map(|p| p.id)
                .unwrap();
            self.role_permissions.push((id, pid));
        }
        id
    }
}

fn page_slice<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip((page.index() * u64::from(page.page_size)) as usize)
        .take(page.page_size as usize)
        .cloned()
        .collect()
}

/// In-memory stand-in for every repository, sharing one graph across clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    graph: Arc<Mutex<Graph>>,
    tag_queries: Arc<AtomicUsize>,
    /// Invalidated after each tag read, as a log write landing mid-query would.
    racing_writer: Arc<Mutex<Option<TagCache>>>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding the built-in permission and role catalogue.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut g = store.graph.lock().unwrap();
            for spec in BUILTIN_PERMISSIONS {
                let id = g.next_id();
                g.permissions.push(Permission {
                    id,
                    name: spec.name.to_owned(),
                    display_name: spec.display_name.to_owned(),
                    description: Some(spec.description.to_owned()),
                    category: spec.category.to_owned(),
                });
            }
            for spec in BUILTIN_ROLES {
                g.insert_role(spec.name, spec.is_system, spec.permissions);
            }
        }
        store
    }

    /// Insert a user holding `role_names`. The stored hash never verifies.
    pub fn add_user(&self, username: &str, role_names: &[&str]) -> i32 {
        self.insert_user(username, None, "not-a-phc-string".to_owned(), role_names)
    }

    /// Insert a user whose password verifies against `password`.
    pub fn add_user_with_password(&self, username: &str, password: &str, role_names: &[&str]) -> i32 {
        let hash = hash_password(password).unwrap();
        self.insert_user(username, None, hash, role_names)
    }

    pub fn add_user_with_email(&self, username: &str, email: &str) -> i32 {
        self.insert_user(username, Some(email.to_owned()), "not-a-phc-string".to_owned(), &[])
    }

    fn insert_user(
        &self,
        username: &str,
        email: Option<String>,
        hashed_password: String,
        role_names: &[&str],
    ) -> i32 {
        let mut g = self.graph.lock().unwrap();
        let id = g.next_id();
        let now = Utc::now();
        g.users.push(User {
            id,
            username: username.to_owned(),
            email,
            hashed_password,
            is_active: true,
            created_at: now,
            updated_at: now,
        });
        for name in role_names {
            let rid = g.roles.iter().find(|r| r.name == *name).map(|r| r.id).unwrap();
            g.user_roles.push((id, rid));
        }
        id
    }

    pub fn add_role(&self, name: &str, permission_names: &[&str]) -> i32 {
        self.graph
            .lock()
            .unwrap()
            .insert_role(name, false, permission_names)
    }

    pub fn add_log(&self, title: &str, tools: &[&str], models: &[&str]) -> i32 {
        let mut g = self.graph.lock().unwrap();
        let id = g.next_id();
        let now = Utc::now();
        g.logs.push(GenLog {
            id,
            title: title.to_owned(),
            log_type: LogType::Txt2Img,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            models: models.iter().map(|m| m.to_string()).collect(),
            prompt: None,
            params_note: None,
            comparison_group_id: None,
            is_nsfw: false,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn attachment_count(&self) -> usize {
        let g = self.graph.lock().unwrap();
        g.assets.len() + g.output_groups.len()
    }

    pub fn disable_user(&self, id: i32) {
        let mut g = self.graph.lock().unwrap();
        if let Some(u) = g.users.iter_mut().find(|u| u.id == id) {
            u.is_active = false;
        }
    }

    pub fn role_id(&self, name: &str) -> i32 {
        let g = self.graph.lock().unwrap();
        g.roles.iter().find(|r| r.name == name).map(|r| r.id).unwrap()
    }

    pub fn role_exists(&self, name: &str) -> bool {
        let g = self.graph.lock().unwrap();
        g.roles.iter().any(|r| r.name == name)
    }

    pub fn user_exists(&self, id: i32) -> bool {
        let g = self.graph.lock().unwrap();
        g.users.iter().any(|u| u.id == id)
    }

    pub fn user_count(&self) -> usize {
        self.graph.lock().unwrap().users.len()
    }

    /// Sorted role names held by `user_id`.
    pub fn role_names_of(&self, user_id: i32) -> Vec<String> {
        let g = self.graph.lock().unwrap();
        let mut names: Vec<String> = g
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| g.roles.iter().find(|x| x.id == *r))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Sorted permission names bundled by role `name`.
    pub fn permission_names_of(&self, name: &str) -> Vec<String> {
        let g = self.graph.lock().unwrap();
        let role = g.roles.iter().find(|r| r.name == name).unwrap();
        g.role_aggregate(role).permission_names()
    }

    /// Number of tag aggregate queries served by the store.
    pub fn tag_queries(&self) -> usize {
        self.tag_queries.load(Ordering::SeqCst)
    }

    pub fn invalidate_during_tag_reads(&self, cache: TagCache) {
        *self.racing_writer.lock().unwrap() = Some(cache);
    }

    fn count_tag_query(&self) {
        self.tag_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(cache) = self.racing_writer.lock().unwrap().as_ref() {
            cache.invalidate();
        }
    }

    pub async fn principal(&self, user_id: i32) -> Principal {
        let user = UserRepository::find_by_id(self, user_id)
            .await
            .unwrap()
            .unwrap();
        Principal::new(user)
    }
}

impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserAggregate>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.users.iter().find(|u| u.id == id).map(|u| g.user_aggregate(u)))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAggregate>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| g.user_aggregate(u)))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.users.iter().any(|u| u.email.as_deref() == Some(email)))
    }

    async fn create(&self, user: &NewUser, role_ids: &[i32]) -> Result<User, VaultError> {
        let mut g = self.graph.lock().unwrap();
        let id = g.next_id();
        let now = Utc::now();
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hashed_password: user.hashed_password.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        g.users.push(created.clone());
        g.user_roles.extend(role_ids.iter().map(|&r| (id, r)));
        Ok(created)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserAggregate>, u64), VaultError> {
        let g = self.graph.lock().unwrap();
        let search = filter.search.as_deref().map(str::to_lowercase);
        let role_id = filter
            .role
            .as_deref()
            .map(|name| g.roles.iter().find(|r| r.name == name).map(|r| r.id));

        let mut matched: Vec<&User> = g
            .users
            .iter()
            .filter(|u| match &search {
                Some(s) => {
                    u.username.to_lowercase().contains(s)
                        || u.email.as_deref().is_some_and(|e| e.to_lowercase().contains(s))
                }
                None => true,
            })
            .filter(|u| match role_id {
                Some(Some(rid)) => g.user_roles.contains(&(u.id, rid)),
                Some(None) => false,
                None => true,
            })
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let users = page_slice(&matched, page)
            .into_iter()
            .map(|u| g.user_aggregate(u))
            .collect();
        Ok((users, total))
    }

    async fn apply_changes(&self, id: i32, changes: &UserChanges) -> Result<(), VaultError> {
        let mut g = self.graph.lock().unwrap();
        if !g.users.iter().any(|u| u.id == id) {
            return Err(VaultError::UserNotFound);
        }
        if let Some(is_active) = changes.is_active {
            if let Some(u) = g.users.iter_mut().find(|u| u.id == id) {
                u.is_active = is_active;
                u.updated_at = Utc::now();
            }
        }
        if let Some(ref role_ids) = changes.role_ids {
            g.user_roles.retain(|(u, _)| *u != id);
            g.user_roles.extend(role_ids.iter().map(|&r| (id, r)));
        }
        Ok(())
    }

    async fn has_role(&self, user_id: i32, role_id: i32) -> Result<bool, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.user_roles.contains(&(user_id, role_id)))
    }

    async fn add_role(&self, user_id: i32, role_id: i32) -> Result<(), VaultError> {
        let mut g = self.graph.lock().unwrap();
        if g.user_roles.contains(&(user_id, role_id)) {
            return Err(VaultError::RoleAlreadyAssigned);
        }
        g.user_roles.push((user_id, role_id));
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<bool, VaultError> {
        let mut g = self.graph.lock().unwrap();
        let before = g.users.len();
        g.users.retain(|u| u.id != id);
        g.user_roles.retain(|(u, _)| *u != id);
        g.favorites.retain(|f| f.user_id != id);
        Ok(g.users.len() < before)
    }

    async fn stats(&self) -> Result<UserStats, VaultError> {
        let g = self.graph.lock().unwrap();
        let mut role_counts: Vec<(String, u64)> = g
            .roles
            .iter()
            .map(|r| (r.name.clone(), g.holders(r.id)))
            .collect();
        role_counts.sort();
        Ok(UserStats {
            total_users: g.users.len() as u64,
            active_users: g.users.iter().filter(|u| u.is_active).count() as u64,
            role_counts,
        })
    }
}

impl RoleRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<RoleWithPermissions>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.roles.iter().find(|r| r.id == id).map(|r| g.role_aggregate(r)))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g
            .roles
            .iter()
            .filter(|r| names.contains(&r.name))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<RoleWithPermissions>, VaultError> {
        let g = self.graph.lock().unwrap();
        let mut roles: Vec<&Role> = g.roles.iter().collect();
        roles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(roles.into_iter().map(|r| g.role_aggregate(r)).collect())
    }

    async fn create(&self, role: &NewRole, permission_ids: &[i32]) -> Result<i32, VaultError> {
        let mut g = self.graph.lock().unwrap();
        if g.roles.iter().any(|r| r.name == role.name) {
            return Err(VaultError::RoleNameTaken);
        }
        let id = g.next_id();
        let now = Utc::now();
        g.roles.push(Role {
            id,
            name: role.name.clone(),
            display_name: role.display_name.clone(),
            description: role.description.clone(),
            is_system: false,
            created_at: now,
            updated_at: now,
        });
        g.role_permissions
            .extend(permission_ids.iter().map(|&p| (id, p)));
        Ok(id)
    }

    async fn update(&self, id: i32, changes: &RoleChanges) -> Result<(), VaultError> {
        let mut g = self.graph.lock().unwrap();
        let role = g
            .roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(VaultError::RoleNotFound)?;
        if let Some(ref display_name) = changes.display_name {
            role.display_name = display_name.clone();
        }
        if let Some(ref description) = changes.description {
            role.description = Some(description.clone());
        }
        role.updated_at = Utc::now();
        if let Some(ref permission_ids) = changes.permission_ids {
            g.role_permissions.retain(|(r, _)| *r != id);
            g.role_permissions
                .extend(permission_ids.iter().map(|&p| (id, p)));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), VaultError> {
        let mut g = self.graph.lock().unwrap();
        if !g.roles.iter().any(|r| r.id == id) {
            return Err(VaultError::RoleNotFound);
        }
        let holders = g.holders(id);
        if holders > 0 {
            return Err(VaultError::RoleInUse(holders));
        }
        g.roles.retain(|r| r.id != id);
        g.role_permissions.retain(|(r, _)| *r != id);
        Ok(())
    }

    async fn count_holders(&self, id: i32) -> Result<u64, VaultError> {
        Ok(self.graph.lock().unwrap().holders(id))
    }
}

impl PermissionRepository for MemoryStore {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Permission>, VaultError> {
        let g = self.graph.lock().unwrap();
        let mut permissions: Vec<Permission> = g
            .permissions
            .iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        permissions.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(permissions)
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g
            .permissions
            .iter()
            .filter(|p| names.contains(&p.name))
            .cloned()
            .collect())
    }
}

impl LogRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<GenLog>, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.logs.iter().find(|l| l.id == id).cloned())
    }

    async fn find_detail(&self, id: i32) -> Result<Option<LogDetail>, VaultError> {
        let g = self.graph.lock().unwrap();
        let Some(log) = g.logs.iter().find(|l| l.id == id).cloned() else {
            return Ok(None);
        };
        let mut assets: Vec<LogAsset> =
            g.assets.iter().filter(|a| a.log_id == id).cloned().collect();
        assets.sort_by_key(|a| (a.sort_order, a.id));
        let mut output_groups: Vec<OutputGroup> = g
            .output_groups
            .iter()
            .filter(|o| o.log_id == id)
            .cloned()
            .collect();
        output_groups.sort_by_key(|o| (o.sort_order, o.id));
        Ok(Some(LogDetail {
            log,
            assets,
            output_groups,
        }))
    }

    async fn list(
        &self,
        filter: &LogFilter,
        page: PageRequest,
    ) -> Result<(Vec<GenLog>, u64), VaultError> {
        let g = self.graph.lock().unwrap();
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<GenLog> = g
            .logs
            .iter()
            .filter(|l| search.as_ref().is_none_or(|s| l.title.to_lowercase().contains(s)))
            .filter(|l| filter.log_type.is_none_or(|t| l.log_type == t))
            .filter(|l| filter.tool.as_ref().is_none_or(|t| l.tools.contains(t)))
            .filter(|l| filter.model.as_ref().is_none_or(|m| l.models.contains(m)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matched.len() as u64;
        Ok((page_slice(&matched, page), total))
    }

    async fn create(&self, log: &NewGenLog) -> Result<GenLog, VaultError> {
        let mut g = self.graph.lock().unwrap();
        let id = g.next_id();
        let now = Utc::now();
        let created = GenLog {
            id,
            title: log.title.clone(),
            log_type: log.log_type,
            tools: log.tools.clone().unwrap_or_default(),
            models: log.models.clone().unwrap_or_default(),
            prompt: log.prompt.clone(),
            params_note: log.params_note.clone(),
            comparison_group_id: log.comparison_group_id,
            is_nsfw: log.is_nsfw,
            created_at: now,
            updated_at: now,
        };
        g.logs.push(created.clone());
        for asset in &log.assets {
            let asset_id = g.next_id();
            g.assets.push(LogAsset {
                id: asset_id,
                log_id: id,
                file_key: asset.file_key.clone(),
                asset_type: asset.asset_type,
                note: asset.note.clone(),
                sort_order: asset.sort_order,
                created_at: now,
            });
        }
        for group in &log.output_groups {
            let group_id = g.next_id();
            g.output_groups.push(OutputGroup {
                id: group_id,
                log_id: id,
                tools: group.tools.clone().unwrap_or_default(),
                models: group.models.clone().unwrap_or_default(),
                sort_order: group.sort_order,
                created_at: now,
            });
        }
        Ok(created)
    }

    async fn update(&self, id: i32, changes: &GenLogChanges) -> Result<(), VaultError> {
        let mut g = self.graph.lock().unwrap();
        let Some(log) = g.logs.iter_mut().find(|l| l.id == id) else {
            return Ok(());
        };
        if let Some(ref title) = changes.title {
            log.title = title.clone();
        }
        if let Some(log_type) = changes.log_type {
            log.log_type = log_type;
        }
        if let Some(ref tools) = changes.tools {
            log.tools = tools.clone().unwrap_or_default();
        }
        if let Some(ref models) = changes.models {
            log.models = models.clone().unwrap_or_default();
        }
        if let Some(ref prompt) = changes.prompt {
            log.prompt = Some(prompt.clone());
        }
        if let Some(ref params_note) = changes.params_note {
            log.params_note = Some(params_note.clone());
        }
        if let Some(group_id) = changes.comparison_group_id {
            log.comparison_group_id = Some(group_id);
        }
        if let Some(is_nsfw) = changes.is_nsfw {
            log.is_nsfw = is_nsfw;
        }
        log.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<bool, VaultError> {
        let mut g = self.graph.lock().unwrap();
        let before = g.logs.len();
        g.logs.retain(|l| l.id != id);
        g.assets.retain(|a| a.log_id != id);
        g.output_groups.retain(|o| o.log_id != id);
        g.favorites.retain(|f| f.log_id != id);
        Ok(g.logs.len() < before)
    }

    async fn distinct_tags(&self, kind: TagKind) -> Result<Vec<String>, VaultError> {
        self.count_tag_query();
        let g = self.graph.lock().unwrap();
        let mut tags: Vec<String> = g
            .logs
            .iter()
            .flat_map(|l| match kind {
                TagKind::Tools => l.tools.clone(),
                TagKind::Models => l.models.clone(),
            })
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn tag_counts(&self, kind: TagKind) -> Result<Vec<(String, u64)>, VaultError> {
        self.count_tag_query();
        let g = self.graph.lock().unwrap();
        let mut counts: Vec<(String, u64)> = Vec::new();
        for log in &g.logs {
            let tags = match kind {
                TagKind::Tools => &log.tools,
                TagKind::Models => &log.models,
            };
            for tag in tags {
                match counts.iter_mut().find(|(name, _)| name == tag) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((tag.clone(), 1)),
                }
            }
        }
        Ok(counts)
    }
}

impl FavoriteRepository for MemoryStore {
    async fn exists(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.favorites
            .iter()
            .any(|f| f.user_id == user_id && f.log_id == log_id))
    }

    async fn create(&self, user_id: i32, log_id: i32) -> Result<Favorite, VaultError> {
        let mut g = self.graph.lock().unwrap();
        if g.favorites
            .iter()
            .any(|f| f.user_id == user_id && f.log_id == log_id)
        {
            return Err(VaultError::AlreadyFavorited);
        }
        let favorite = Favorite {
            id: g.next_id(),
            user_id,
            log_id,
            created_at: Utc::now(),
        };
        g.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn delete(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError> {
        let mut g = self.graph.lock().unwrap();
        let before = g.favorites.len();
        g.favorites
            .retain(|f| !(f.user_id == user_id && f.log_id == log_id));
        Ok(g.favorites.len() < before)
    }

    async fn list(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<FavoriteEntry>, u64), VaultError> {
        let g = self.graph.lock().unwrap();
        let mut entries: Vec<FavoriteEntry> = g
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| {
                g.logs.iter().find(|l| l.id == f.log_id).map(|l| FavoriteEntry {
                    favorite: f.clone(),
                    log: l.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.favorite
                .created_at
                .cmp(&a.favorite.created_at)
                .then(b.favorite.id.cmp(&a.favorite.id))
        });
        let total = entries.len() as u64;
        Ok((page_slice(&entries, page), total))
    }

    async fn count(&self, user_id: i32) -> Result<u64, VaultError> {
        let g = self.graph.lock().unwrap();
        Ok(g.favorites.iter().filter(|f| f.user_id == user_id).count() as u64)
    }
}

// ── FixedCaptcha ─────────────────────────────────────────────────────────────

/// Single-use captcha with a known id and answer.
#[derive(Clone, Default)]
pub struct FixedCaptcha {
    used: Arc<Mutex<bool>>,
}

impl CaptchaStore for FixedCaptcha {
    fn issue(&self) -> Captcha {
        *self.used.lock().unwrap() = false;
        Captcha {
            id: CAPTCHA_ID.to_owned(),
            question: "40 + 2 = ?".to_owned(),
        }
    }

    fn verify(&self, id: &str, answer: &str) -> bool {
        let mut used = self.used.lock().unwrap();
        if *used || id != CAPTCHA_ID {
            return false;
        }
        *used = true;
        answer.trim() == CAPTCHA_ANSWER
    }
}
