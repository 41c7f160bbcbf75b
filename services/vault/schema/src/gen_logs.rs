use sea_orm::entity::prelude::*;

/// Metadata of one image-generation session.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "gen_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    /// `txt2img` or `img2img`.
    pub log_type: String,
    pub tools: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
    #[sea_orm(has_many = "super::log_assets::Entity")]
    Assets,
    #[sea_orm(has_many = "super::log_output_groups::Entity")]
    OutputGroups,
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::log_assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::log_output_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutputGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
