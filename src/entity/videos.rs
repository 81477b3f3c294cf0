//! 视频实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub video_url: String,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub video_type: String,
    pub quality_options: String, // JSON 字符串数组
    pub subtitles_url: Option<String>,
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
    pub fn into_video(self) -> crate::models::modules::entities::Video {
        use crate::models::modules::entities::{Video, VideoType};

        Video {
            id: self.id,
            module_id: self.module_id,
            title: self.title,
            video_url: self.video_url,
            duration: self.duration,
            thumbnail_url: self.thumbnail_url,
            video_type: self.video_type.parse().unwrap_or(VideoType::Uploaded),
            quality_options: serde_json::from_str(&self.quality_options).unwrap_or_default(),
            subtitles_url: self.subtitles_url,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
