use std::collections::{HashMap, HashSet};

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, SqlErr, Statement, TransactionError,
    TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr, extension::postgres::PgFunc},
};

use vault_domain::catalog::{AssetType, LogType, TagKind};
use vault_domain::pagination::PageRequest;
use vault_schema::{
    favorites, gen_logs, log_assets, log_output_groups, permissions, role_permissions, roles,
    user_roles, users,
};

use crate::domain::repository::{
    FavoriteRepository, LogRepository, PermissionRepository, RoleRepository, UserRepository,
};
use crate::domain::types::{
    Favorite, FavoriteEntry, GenLog, GenLogChanges, LogAsset, LogDetail, LogFilter, NewGenLog,
    NewRole, NewUser, OutputGroup, Permission, Role, RoleChanges, RoleWithPermissions, User,
    UserAggregate, UserChanges, UserFilter, UserStats,
};
use crate::error::VaultError;

/// Postgres names an inline `UNIQUE` constraint `<table>_<column>_key`.
const USERS_EMAIL_KEY: &str = "users_email_key";

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Conflict kind for a unique violation raised while inserting a user.
fn user_conflict(message: &str) -> VaultError {
    if message.contains(USERS_EMAIL_KEY) {
        VaultError::EmailTaken
    } else {
        VaultError::UsernameTaken
    }
}

/// Abort the enclosing transaction for a row that vanished before it was locked.
fn row_gone(table: &str, id: i32) -> DbErr {
    DbErr::RecordNotFound(format!("{table} {id}"))
}

/// Map a transaction aborted by [`row_gone`] to `missing`, anything else to `Internal`.
fn missing_or_internal(
    err: TransactionError<DbErr>,
    missing: VaultError,
    context: &'static str,
) -> VaultError {
    match err {
        TransactionError::Transaction(DbErr::RecordNotFound(_)) => missing,
        other => VaultError::Internal(anyhow::Error::new(other).context(context)),
    }
}

/// Lower-cased substring pattern for case-insensitive `LIKE`.
fn contains_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()))
}

// ── Aggregate loading ────────────────────────────────────────────────────────

async fn load_role_aggregates<C: ConnectionTrait>(
    db: &C,
    models: Vec<roles::Model>,
) -> Result<Vec<RoleWithPermissions>, DbErr> {
    if models.is_empty() {
        return Ok(vec![]);
    }
    let role_ids: Vec<i32> = models.iter().map(|r| r.id).collect();
    let links = role_permissions::Entity::find()
        .filter(role_permissions::Column::RoleId.is_in(role_ids))
        .find_also_related(permissions::Entity)
        .all(db)
        .await?;

    let mut by_role: HashMap<i32, Vec<Permission>> = HashMap::new();
    for (link, permission) in links {
        if let Some(permission) = permission {
            by_role
                .entry(link.role_id)
                .or_default()
                .push(permission_from_model(permission));
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut permissions = by_role.remove(&model.id).unwrap_or_default();
            permissions.sort_by(|a, b| a.name.cmp(&b.name));
            RoleWithPermissions {
                role: role_from_model(model),
                permissions,
            }
        })
        .collect())
}

async fn load_user_aggregates<C: ConnectionTrait>(
    db: &C,
    models: Vec<users::Model>,
) -> Result<Vec<UserAggregate>, DbErr> {
    if models.is_empty() {
        return Ok(vec![]);
    }
    let user_ids: Vec<i32> = models.iter().map(|u| u.id).collect();
    let links = user_roles::Entity::find()
        .filter(user_roles::Column::UserId.is_in(user_ids))
        .order_by_asc(user_roles::Column::Id)
        .all(db)
        .await?;

    let role_ids: HashSet<i32> = links.iter().map(|l| l.role_id).collect();
    let role_models = if role_ids.is_empty() {
        vec![]
    } else {
        roles::Entity::find()
            .filter(roles::Column::Id.is_in(role_ids))
            .all(db)
            .await?
    };
    let roles_by_id: HashMap<i32, RoleWithPermissions> = load_role_aggregates(db, role_models)
        .await?
        .into_iter()
        .map(|r| (r.role.id, r))
        .collect();

    let mut by_user: HashMap<i32, Vec<RoleWithPermissions>> = HashMap::new();
    for link in links {
        if let Some(role) = roles_by_id.get(&link.role_id) {
            by_user.entry(link.user_id).or_default().push(role.clone());
        }
    }

    Ok(models
        .into_iter()
        .map(|model| UserAggregate {
            roles: by_user.remove(&model.id).unwrap_or_default(),
            user: user_from_model(model),
        })
        .collect())
}

async fn insert_user_roles(
    txn: &DatabaseTransaction,
    user_id: i32,
    role_ids: &[i32],
) -> Result<(), DbErr> {
    if role_ids.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    user_roles::Entity::insert_many(role_ids.iter().map(|&role_id| user_roles::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
        created_at: Set(now),
        ..Default::default()
    }))
    .exec(txn)
    .await?;
    Ok(())
}

async fn insert_role_permissions(
    txn: &DatabaseTransaction,
    role_id: i32,
    permission_ids: &[i32],
) -> Result<(), DbErr> {
    if permission_ids.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    role_permissions::Entity::insert_many(permission_ids.iter().map(|&permission_id| {
        role_permissions::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            created_at: Set(now),
            ..Default::default()
        }
    }))
    .exec(txn)
    .await?;
    Ok(())
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserAggregate>, VaultError> {
        let Some(model) = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?
        else {
            return Ok(None);
        };
        let mut loaded = load_user_aggregates(&self.db, vec![model])
            .await
            .context("load user roles")?;
        Ok(loaded.pop())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAggregate>, VaultError> {
        let Some(model) = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?
        else {
            return Ok(None);
        };
        let mut loaded = load_user_aggregates(&self.db, vec![model])
            .await
            .context("load user roles")?;
        Ok(loaded.pop())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, VaultError> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await
            .context("count users by username")?;
        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, VaultError> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await
            .context("count users by email")?;
        Ok(count > 0)
    }

    async fn create(&self, user: &NewUser, role_ids: &[i32]) -> Result<User, VaultError> {
        let user = user.clone();
        let role_ids = role_ids.to_vec();
        let model = self
            .db
            .transaction::<_, users::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = users::ActiveModel {
                        username: Set(user.username),
                        email: Set(user.email),
                        hashed_password: Set(user.hashed_password),
                        is_active: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    insert_user_roles(txn, model.id, &role_ids).await?;
                    Ok(model)
                })
            })
            .await
            .map_err(|e| {
                let conflict = match &e {
                    TransactionError::Transaction(db) => match db.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(message)) => {
                            Some(user_conflict(&message))
                        }
                        _ => None,
                    },
                    _ => None,
                };
                conflict.unwrap_or_else(|| {
                    VaultError::Internal(anyhow::Error::new(e).context("create user"))
                })
            })?;
        Ok(user_from_model(model))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserAggregate>, u64), VaultError> {
        let mut condition = Condition::all();
        if let Some(pattern) = contains_pattern(filter.search.as_deref()) {
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(users::Column::Username)))
                            .like(pattern.clone()),
                    )
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::Email))).like(pattern)),
            );
        }
        if let Some(role) = filter.role.as_deref().filter(|r| !r.is_empty()) {
            let holders = user_roles::Entity::find()
                .select_only()
                .column(user_roles::Column::UserId)
                .inner_join(roles::Entity)
                .filter(roles::Column::Name.eq(role))
                .into_query();
            condition = condition.add(users::Column::Id.in_subquery(holders));
        }

        let paginator = users::Entity::find()
            .filter(condition)
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .paginate(&self.db, u64::from(page.page_size));
        let total = paginator.num_items().await.context("count users")?;
        let models = paginator
            .fetch_page(page.index())
            .await
            .context("list users")?;
        let users = load_user_aggregates(&self.db, models)
            .await
            .context("load user roles")?;
        Ok((users, total))
    }

    async fn apply_changes(&self, id: i32, changes: &UserChanges) -> Result<(), VaultError> {
        let changes = changes.clone();
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    // Serializes concurrent replacements for the same user.
                    let locked = users::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if locked.is_none() {
                        return Err(row_gone("user", id));
                    }
                    if let Some(is_active) = changes.is_active {
                        users::ActiveModel {
                            id: Set(id),
                            is_active: Set(is_active),
                            updated_at: Set(Utc::now()),
                            ..Default::default()
                        }
                        .update(txn)
                        .await?;
                    }
                    if let Some(role_ids) = changes.role_ids {
                        user_roles::Entity::delete_many()
                            .filter(user_roles::Column::UserId.eq(id))
                            .exec(txn)
                            .await?;
                        insert_user_roles(txn, id, &role_ids).await?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(|e| missing_or_internal(e, VaultError::UserNotFound, "apply user changes"))
    }

    async fn has_role(&self, user_id: i32, role_id: i32) -> Result<bool, VaultError> {
        let count = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.eq(role_id))
            .count(&self.db)
            .await
            .context("count user role")?;
        Ok(count > 0)
    }

    async fn add_role(&self, user_id: i32, role_id: i32) -> Result<(), VaultError> {
        let result = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(ref e) if is_unique_violation(e) => Err(VaultError::RoleAlreadyAssigned),
            Err(e) => Err(VaultError::Internal(
                anyhow::Error::new(e).context("add user role"),
            )),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, VaultError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }

    async fn stats(&self) -> Result<UserStats, VaultError> {
        #[derive(FromQueryResult)]
        struct RoleCountRow {
            name: String,
            holders: i64,
        }

        let total_users = users::Entity::find()
            .count(&self.db)
            .await
            .context("count users")?;
        let active_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .context("count active users")?;
        let rows = RoleCountRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            r#"
            SELECT r.name AS name, COUNT(ur.id) AS holders
              FROM roles r
              LEFT JOIN user_roles ur ON ur.role_id = r.id
             GROUP BY r.id, r.name
             ORDER BY r.name
            "#,
        ))
        .all(&self.db)
        .await
        .context("count role holders")?;

        Ok(UserStats {
            total_users,
            active_users,
            role_counts: rows
                .into_iter()
                .map(|r| (r.name, r.holders.max(0) as u64))
                .collect(),
        })
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        hashed_password: model.hashed_password,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Role repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<RoleWithPermissions>, VaultError> {
        let Some(model) = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find role by id")?
        else {
            return Ok(None);
        };
        let mut loaded = load_role_aggregates(&self.db, vec![model])
            .await
            .context("load role permissions")?;
        Ok(loaded.pop())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, VaultError> {
        let model = roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find role by name")?;
        Ok(model.map(role_from_model))
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, VaultError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let models = roles::Entity::find()
            .filter(roles::Column::Name.is_in(names.to_vec()))
            .all(&self.db)
            .await
            .context("find roles by name")?;
        Ok(models.into_iter().map(role_from_model).collect())
    }

    async fn list(&self) -> Result<Vec<RoleWithPermissions>, VaultError> {
        let models = roles::Entity::find()
            .order_by_desc(roles::Column::CreatedAt)
            .order_by_desc(roles::Column::Id)
            .all(&self.db)
            .await
            .context("list roles")?;
        let roles = load_role_aggregates(&self.db, models)
            .await
            .context("load role permissions")?;
        Ok(roles)
    }

    async fn create(&self, role: &NewRole, permission_ids: &[i32]) -> Result<i32, VaultError> {
        let role = role.clone();
        let permission_ids = permission_ids.to_vec();
        self.db
            .transaction::<_, i32, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = roles::ActiveModel {
                        name: Set(role.name),
                        display_name: Set(role.display_name),
                        description: Set(role.description),
                        is_system: Set(false),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    insert_role_permissions(txn, model.id, &permission_ids).await?;
                    Ok(model.id)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Transaction(ref db) if is_unique_violation(db) => {
                    VaultError::RoleNameTaken
                }
                other => VaultError::Internal(anyhow::Error::new(other).context("create role")),
            })
    }

    async fn update(&self, id: i32, changes: &RoleChanges) -> Result<(), VaultError> {
        let changes = changes.clone();
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let locked = roles::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if locked.is_none() {
                        return Err(row_gone("role", id));
                    }
                    let mut am = roles::ActiveModel {
                        id: Set(id),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    if let Some(display_name) = changes.display_name {
                        am.display_name = Set(display_name);
                    }
                    if let Some(description) = changes.description {
                        am.description = Set(Some(description));
                    }
                    am.update(txn).await?;

                    if let Some(permission_ids) = changes.permission_ids {
                        role_permissions::Entity::delete_many()
                            .filter(role_permissions::Column::RoleId.eq(id))
                            .exec(txn)
                            .await?;
                        insert_role_permissions(txn, id, &permission_ids).await?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(|e| missing_or_internal(e, VaultError::RoleNotFound, "update role"))
    }

    async fn delete(&self, id: i32) -> Result<(), VaultError> {
        let holders = self
            .db
            .transaction::<_, u64, DbErr>(|txn| {
                Box::pin(async move {
                    // Blocks concurrent user_roles inserts referencing this row.
                    let locked = roles::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if locked.is_none() {
                        return Err(row_gone("role", id));
                    }
                    let holders = user_roles::Entity::find()
                        .filter(user_roles::Column::RoleId.eq(id))
                        .count(txn)
                        .await?;
                    if holders == 0 {
                        let deleted = roles::Entity::delete_by_id(id).exec(txn).await?;
                        if deleted.rows_affected == 0 {
                            return Err(row_gone("role", id));
                        }
                    }
                    Ok(holders)
                })
            })
            .await
            .map_err(|e| missing_or_internal(e, VaultError::RoleNotFound, "delete role"))?;
        if holders > 0 {
            return Err(VaultError::RoleInUse(holders));
        }
        Ok(())
    }

    async fn count_holders(&self, id: i32) -> Result<u64, VaultError> {
        let count = user_roles::Entity::find()
            .filter(user_roles::Column::RoleId.eq(id))
            .count(&self.db)
            .await
            .context("count role holders")?;
        Ok(count)
    }
}

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
        display_name: model.display_name,
        description: model.description,
        is_system: model.is_system,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Permission repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPermissionRepository {
    pub db: DatabaseConnection,
}

impl PermissionRepository for DbPermissionRepository {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Permission>, VaultError> {
        let mut query = permissions::Entity::find();
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            query = query.filter(permissions::Column::Category.eq(category));
        }
        let models = query
            .order_by_asc(permissions::Column::Category)
            .order_by_asc(permissions::Column::Name)
            .all(&self.db)
            .await
            .context("list permissions")?;
        Ok(models.into_iter().map(permission_from_model).collect())
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, VaultError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let models = permissions::Entity::find()
            .filter(permissions::Column::Name.is_in(names.to_vec()))
            .all(&self.db)
            .await
            .context("find permissions by name")?;
        Ok(models.into_iter().map(permission_from_model).collect())
    }
}

fn permission_from_model(model: permissions::Model) -> Permission {
    Permission {
        id: model.id,
        name: model.name,
        display_name: model.display_name,
        description: model.description,
        category: model.category,
    }
}

// ── Log repository ───────────────────────────────────────────────────────────

/// `value = ANY(column)` with `value` bound as a parameter.
fn array_contains(column: gen_logs::Column, value: &str) -> SimpleExpr {
    Expr::val(value.to_owned()).eq(PgFunc::any(Expr::col(column)))
}

fn log_condition(filter: &LogFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(pattern) = contains_pattern(filter.search.as_deref()) {
        condition = condition
            .add(Expr::expr(Func::lower(Expr::col(gen_logs::Column::Title))).like(pattern));
    }
    if let Some(log_type) = filter.log_type {
        condition = condition.add(gen_logs::Column::LogType.eq(log_type.as_str()));
    }
    if let Some(tool) = filter.tool.as_deref().filter(|t| !t.is_empty()) {
        condition = condition.add(array_contains(gen_logs::Column::Tools, tool));
    }
    if let Some(model) = filter.model.as_deref().filter(|m| !m.is_empty()) {
        condition = condition.add(array_contains(gen_logs::Column::Models, model));
    }
    condition
}

#[derive(Clone)]
pub struct DbLogRepository {
    pub db: DatabaseConnection,
}

impl LogRepository for DbLogRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<GenLog>, VaultError> {
        let model = gen_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find log by id")?;
        model.map(log_from_model).transpose()
    }

    async fn find_detail(&self, id: i32) -> Result<Option<LogDetail>, VaultError> {
        let Some(log) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let assets = log_assets::Entity::find()
            .filter(log_assets::Column::LogId.eq(id))
            .order_by_asc(log_assets::Column::SortOrder)
            .order_by_asc(log_assets::Column::Id)
            .all(&self.db)
            .await
            .context("load log assets")?
            .into_iter()
            .map(asset_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        let output_groups = log_output_groups::Entity::find()
            .filter(log_output_groups::Column::LogId.eq(id))
            .order_by_asc(log_output_groups::Column::SortOrder)
            .order_by_asc(log_output_groups::Column::Id)
            .all(&self.db)
            .await
            .context("load output groups")?
            .into_iter()
            .map(output_group_from_model)
            .collect();
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
        let paginator = gen_logs::Entity::find()
            .filter(log_condition(filter))
            .order_by_desc(gen_logs::Column::CreatedAt)
            .order_by_desc(gen_logs::Column::Id)
            .paginate(&self.db, u64::from(page.page_size));
        let total = paginator.num_items().await.context("count logs")?;
        let models = paginator
            .fetch_page(page.index())
            .await
            .context("list logs")?;
        let logs = models
            .into_iter()
            .map(log_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((logs, total))
    }

    async fn create(&self, log: &NewGenLog) -> Result<GenLog, VaultError> {
        let log = log.clone();
        let model = self
            .db
            .transaction::<_, gen_logs::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = gen_logs::ActiveModel {
                        title: Set(log.title),
                        log_type: Set(log.log_type.as_str().to_owned()),
                        tools: Set(log.tools),
                        models: Set(log.models),
                        prompt: Set(log.prompt),
                        params_note: Set(log.params_note),
                        comparison_group_id: Set(log.comparison_group_id),
                        is_nsfw: Set(log.is_nsfw),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    if !log.assets.is_empty() {
                        log_assets::Entity::insert_many(log.assets.into_iter().map(|asset| {
                            log_assets::ActiveModel {
                                log_id: Set(model.id),
                                file_key: Set(asset.file_key),
                                asset_type: Set(asset.asset_type.as_str().to_owned()),
                                note: Set(asset.note),
                                sort_order: Set(asset.sort_order),
                                created_at: Set(now),
                                ..Default::default()
                            }
                        }))
                        .exec(txn)
                        .await?;
                    }
                    if !log.output_groups.is_empty() {
                        log_output_groups::Entity::insert_many(log.output_groups.into_iter().map(
                            |group| log_output_groups::ActiveModel {
                                log_id: Set(model.id),
                                tools: Set(group.tools),
                                models: Set(group.models),
                                sort_order: Set(group.sort_order),
                                created_at: Set(now),
                                ..Default::default()
                            },
                        ))
                        .exec(txn)
                        .await?;
                    }
                    Ok(model)
                })
            })
            .await
            .context("create log")?;
        log_from_model(model)
    }

    async fn update(&self, id: i32, changes: &GenLogChanges) -> Result<(), VaultError> {
        let mut am = gen_logs::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(ref title) = changes.title {
            am.title = Set(title.clone());
        }
        if let Some(log_type) = changes.log_type {
            am.log_type = Set(log_type.as_str().to_owned());
        }
        if let Some(ref tools) = changes.tools {
            am.tools = Set(tools.clone());
        }
        if let Some(ref models) = changes.models {
            am.models = Set(models.clone());
        }
        if let Some(ref prompt) = changes.prompt {
            am.prompt = Set(Some(prompt.clone()));
        }
        if let Some(ref params_note) = changes.params_note {
            am.params_note = Set(Some(params_note.clone()));
        }
        if let Some(group_id) = changes.comparison_group_id {
            am.comparison_group_id = Set(Some(group_id));
        }
        if let Some(is_nsfw) = changes.is_nsfw {
            am.is_nsfw = Set(is_nsfw);
        }
        am.update(&self.db).await.context("update log")?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<bool, VaultError> {
        let result = gen_logs::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete log")?;
        Ok(result.rows_affected > 0)
    }

    async fn distinct_tags(&self, kind: TagKind) -> Result<Vec<String>, VaultError> {
        #[derive(FromQueryResult)]
        struct TagRow {
            name: String,
        }

        let sql = format!(
            r#"
            SELECT DISTINCT tag AS name
              FROM gen_logs, unnest({column}) AS tag
             WHERE btrim(tag) <> ''
             ORDER BY name
            "#,
            column = kind.as_str(),
        );
        let rows = TagRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            sql,
        ))
        .all(&self.db)
        .await
        .context("list distinct tags")?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn tag_counts(&self, kind: TagKind) -> Result<Vec<(String, u64)>, VaultError> {
        #[derive(FromQueryResult)]
        struct TagCountRow {
            name: String,
            uses: i64,
        }

        let sql = format!(
            r#"
            SELECT tag AS name, COUNT(*) AS uses
              FROM gen_logs, unnest({column}) AS tag
             WHERE btrim(tag) <> ''
             GROUP BY tag
             ORDER BY uses DESC, name
            "#,
            column = kind.as_str(),
        );
        let rows = TagCountRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            sql,
        ))
        .all(&self.db)
        .await
        .context("count tags")?;
        Ok(rows
            .into_iter()
            .map(|r| (r.name, r.uses.max(0) as u64))
            .collect())
    }
}

fn log_from_model(model: gen_logs::Model) -> Result<GenLog, VaultError> {
    let log_type = model
        .log_type
        .parse::<LogType>()
        .context("decode stored log type")?;
    Ok(GenLog {
        id: model.id,
        title: model.title,
        log_type,
        tools: model.tools.unwrap_or_default(),
        models: model.models.unwrap_or_default(),
        prompt: model.prompt,
        params_note: model.params_note,
        comparison_group_id: model.comparison_group_id,
        is_nsfw: model.is_nsfw,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn asset_from_model(model: log_assets::Model) -> Result<LogAsset, VaultError> {
    let asset_type = model
        .asset_type
        .parse::<AssetType>()
        .context("decode stored asset type")?;
    Ok(LogAsset {
        id: model.id,
        log_id: model.log_id,
        file_key: model.file_key,
        asset_type,
        note: model.note,
        sort_order: model.sort_order,
        created_at: model.created_at,
    })
}

fn output_group_from_model(model: log_output_groups::Model) -> OutputGroup {
    OutputGroup {
        id: model.id,
        log_id: model.log_id,
        tools: model.tools.unwrap_or_default(),
        models: model.models.unwrap_or_default(),
        sort_order: model.sort_order,
        created_at: model.created_at,
    }
}

// ── Favorite repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbFavoriteRepository {
    pub db: DatabaseConnection,
}

impl FavoriteRepository for DbFavoriteRepository {
    async fn exists(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError> {
        let count = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::LogId.eq(log_id))
            .count(&self.db)
            .await
            .context("count favorite")?;
        Ok(count > 0)
    }

    async fn create(&self, user_id: i32, log_id: i32) -> Result<Favorite, VaultError> {
        let result = favorites::ActiveModel {
            user_id: Set(user_id),
            log_id: Set(log_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(model) => Ok(favorite_from_model(model)),
            Err(ref e) if is_unique_violation(e) => Err(VaultError::AlreadyFavorited),
            Err(e) => Err(VaultError::Internal(
                anyhow::Error::new(e).context("create favorite"),
            )),
        }
    }

    async fn delete(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError> {
        let result = favorites::Entity::delete_many()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::LogId.eq(log_id))
            .exec(&self.db)
            .await
            .context("delete favorite")?;
        Ok(result.rows_affected > 0)
    }

    async fn list(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<FavoriteEntry>, u64), VaultError> {
        let paginator = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .find_also_related(gen_logs::Entity)
            .order_by_desc(favorites::Column::CreatedAt)
            .order_by_desc(favorites::Column::Id)
            .paginate(&self.db, u64::from(page.page_size));
        let total = paginator.num_items().await.context("count favorites")?;
        let rows = paginator
            .fetch_page(page.index())
            .await
            .context("list favorites")?;

        let mut entries = Vec::with_capacity(rows.len());
        for (favorite, log) in rows {
            // The FK cascade removes favorites with their log.
            if let Some(log) = log {
                entries.push(FavoriteEntry {
                    favorite: favorite_from_model(favorite),
                    log: log_from_model(log)?,
                });
            }
        }
        Ok((entries, total))
    }

    async fn count(&self, user_id: i32) -> Result<u64, VaultError> {
        let count = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("count favorites")?;
        Ok(count)
    }
}

fn favorite_from_model(model: favorites::Model) -> Favorite {
    Favorite {
        id: model.id,
        user_id: model.user_id,
        log_id: model.log_id,
        created_at: model.created_at,
    }
}
