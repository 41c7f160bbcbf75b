use sea_orm::entity::prelude::*;

/// Object-store key of an image attached to a log.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "log_assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub log_id: i32,
    #[sea_orm(column_type = "Text")]
    pub file_key: String,
    /// `input` or `output`.
    pub asset_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub sort_order: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gen_logs::Entity",
        from = "Column::LogId",
        to = "super::gen_logs::Column::Id",
        on_delete = "Cascade"
    )]
    GenLog,
}

impl Related<super::gen_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
