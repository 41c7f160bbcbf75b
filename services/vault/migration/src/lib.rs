use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_rbac_tables;
mod m20250301_000003_create_gen_logs;
mod m20250301_000004_create_favorites;
mod m20250301_000005_seed_rbac;
mod m20250301_000006_create_log_attachments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_rbac_tables::Migration),
            Box::new(m20250301_000003_create_gen_logs::Migration),
            Box::new(m20250301_000004_create_favorites::Migration),
            Box::new(m20250301_000005_seed_rbac::Migration),
            Box::new(m20250301_000006_create_log_attachments::Migration),
        ]
    }
}
