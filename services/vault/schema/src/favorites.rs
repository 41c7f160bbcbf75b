use sea_orm::entity::prelude::*;

/// A user's bookmark of a generation log. `(user_id, log_id)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub log_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::gen_logs::Entity",
        from = "Column::LogId",
        to = "super::gen_logs::Column::Id",
        on_delete = "Cascade"
    )]
    GenLog,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::gen_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
