//! 单题作答实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quiz_responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub question_option_id: Option<i64>,
    pub text_response: Option<String>,
    pub is_correct: Option<bool>,
    pub points_earned: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quiz_attempts::Entity",
        from = "Column::AttemptId",
        to = "super::quiz_attempts::Column::Id",
        on_delete = "Cascade"
    )]
    Attempt,
}

impl Related<super::quiz_attempts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_response(self) -> crate::models::quizzes::entities::QuizResponse {
        crate::models::quizzes::entities::QuizResponse {
            id: self.id,
            attempt_id: self.attempt_id,
            question_id: self.question_id,
            question_option_id: self.question_option_id,
            text_response: self.text_response,
            is_correct: self.is_correct,
            points_earned: self.points_earned,
        }
    }
}
