//! 课程实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub creator_id: i64,
    pub status: String,
    pub difficulty_level: String,
    pub estimated_duration: Option<i32>,
    pub is_mandatory: bool,
    pub tags: String,          // JSON 字符串数组
    pub prerequisites: String, // JSON 课程 ID 数组
    pub thumbnail_url: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "super::modules::Entity")]
    Modules,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::modules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_course(self) -> crate::models::courses::entities::Course {
        use super::{opt_ts_to_datetime, ts_to_datetime};
        use crate::models::courses::entities::{Course, CourseStatus, DifficultyLevel};

        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            category_id: self.category_id,
            creator_id: self.creator_id,
            status: self.status.parse().unwrap_or(CourseStatus::Draft),
            difficulty_level: self
                .difficulty_level
                .parse()
                .unwrap_or(DifficultyLevel::Beginner),
            estimated_duration: self.estimated_duration,
            is_mandatory: self.is_mandatory,
            tags: serde_json::from_str(&self.tags).unwrap_or_default(),
            prerequisites: serde_json::from_str(&self.prerequisites).unwrap_or_default(),
            thumbnail_url: self.thumbnail_url,
            published_at: opt_ts_to_datetime(self.published_at),
            created_at: ts_to_datetime(self.created_at),
            updated_at: ts_to_datetime(self.updated_at),
        }
    }
}
