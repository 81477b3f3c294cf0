//! 文档实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub download_count: i64,
    pub is_downloadable: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::modules::Entity",
        from = "Column::ModuleId",
        to = "super::modules::Column::Id",
        on_delete = "Cascade"
    )]
    Module,
}

impl Related<super::modules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_document(self) -> crate::models::modules::entities::Document {
        crate::models::modules::entities::Document {
            id: self.id,
            module_id: self.module_id,
            title: self.title,
            file_path: self.file_path,
            file_type: self.file_type,
            file_size: self.file_size,
            download_count: self.download_count,
            is_downloadable: self.is_downloadable,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
