//! 测验实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quizzes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_limit: Option<i32>,
    pub max_attempts: i32,
    pub passing_score: f64,
    pub randomize_questions: bool,
    pub show_results_immediately: bool,
    pub allow_review: bool,
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
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
    #[sea_orm(has_many = "super::quiz_attempts::Entity")]
    Attempts,
}

impl Related<super::modules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::quiz_attempts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_quiz(self) -> crate::models::quizzes::entities::Quiz {
        crate::models::quizzes::entities::Quiz {
            id: self.id,
            module_id: self.module_id,
            title: self.title,
            description: self.description,
            time_limit: self.time_limit,
            max_attempts: self.max_attempts,
            passing_score: self.passing_score,
            randomize_questions: self.randomize_questions,
            show_results_immediately: self.show_results_immediately,
            allow_review: self.allow_review,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
