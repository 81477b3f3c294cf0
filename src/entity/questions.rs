//! 题目实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub points: f64,
    pub order_index: i32,
    pub explanation: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quizzes::Entity",
        from = "Column::QuizId",
        to = "super::quizzes::Column::Id",
        on_delete = "Cascade"
    )]
    Quiz,
    #[sea_orm(has_many = "super::question_options::Entity")]
    Options,
}

impl Related<super::quizzes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl Related<super::question_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Options.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_question(
        self,
        options: Vec<crate::models::quizzes::entities::QuestionOption>,
    ) -> crate::models::quizzes::entities::Question {
        use crate::models::quizzes::entities::{Question, QuestionType};

        Question {
            id: self.id,
            quiz_id: self.quiz_id,
            question_text: self.question_text,
            question_type: self
                .question_type
                .parse()
                .unwrap_or(QuestionType::ShortAnswer),
            points: self.points,
            order_index: self.order_index,
            explanation: self.explanation,
            options,
        }
    }
}
