//! 课程模块实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub content_url: Option<String>,
    pub content_data: Option<String>, // JSON
    pub order_index: i32,
    pub is_mandatory: bool,
    pub estimated_duration: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::documents::Entity")]
    Documents,
    #[sea_orm(has_many = "super::videos::Entity")]
    Videos,
    #[sea_orm(has_many = "super::quizzes::Entity")]
    Quizzes,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::videos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl Related<super::quizzes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quizzes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_module(self) -> crate::models::modules::entities::Module {
        use crate::models::modules::entities::{ContentType, Module};

        Module {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            content_type: self.content_type.parse().unwrap_or(ContentType::Document),
            content_url: self.content_url,
            content_data: self
                .content_data
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            order_index: self.order_index,
            is_mandatory: self.is_mandatory,
            estimated_duration: self.estimated_duration,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
