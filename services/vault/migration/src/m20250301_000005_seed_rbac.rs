use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

use vault_domain::rbac::{BUILTIN_PERMISSIONS, BUILTIN_ROLES};

/// Seeds the built-in permission catalogue and roles. Re-running is a no-op.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for p in BUILTIN_PERMISSIONS {
            let insert = Query::insert()
                .into_table(Permissions::Table)
                .columns([
                    Permissions::Name,
                    Permissions::DisplayName,
                    Permissions::Description,
                    Permissions::Category,
                ])
                .values_panic([
                    p.name.into(),
                    p.display_name.into(),
                    p.description.into(),
                    p.category.into(),
                ])
                .on_conflict(OnConflict::column(Permissions::Name).do_nothing().to_owned())
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        for role in BUILTIN_ROLES {
            let insert = Query::insert()
                .into_table(Roles::Table)
                .columns([
                    Roles::Name,
                    Roles::DisplayName,
                    Roles::Description,
                    Roles::IsSystem,
                ])
                .values_panic([
                    role.name.into(),
                    role.display_name.into(),
                    role.description.into(),
                    role.is_system.into(),
                ])
                .on_conflict(OnConflict::column(Roles::Name).do_nothing().to_owned())
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        let db = manager.get_connection();
        let backend = manager.get_database_backend();
        for role in BUILTIN_ROLES {
            for permission in role.permissions {
                db.execute(Statement::from_sql_and_values(
                    backend,
                    r#"
                    INSERT INTO role_permissions (role_id, permission_id)
                    SELECT r.id, p.id FROM roles r, permissions p
                    WHERE r.name = $1 AND p.name = $2
                    ON CONFLICT (role_id, permission_id) DO NOTHING
                    "#,
                    [role.name.into(), (*permission).into()],
                ))
                .await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let role_names: Vec<&str> = BUILTIN_ROLES.iter().map(|r| r.name).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Roles::Table)
                    .and_where(Expr::col(Roles::Name).is_in(role_names))
                    .to_owned(),
            )
            .await?;

        let permission_names: Vec<&str> = BUILTIN_PERMISSIONS.iter().map(|p| p.name).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Permissions::Table)
                    .and_where(Expr::col(Permissions::Name).is_in(permission_names))
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Name,
    DisplayName,
    Description,
    IsSystem,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Name,
    DisplayName,
    Description,
    Category,
}
