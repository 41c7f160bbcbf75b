use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "log_output_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub log_id: i32,
    pub tools: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
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
