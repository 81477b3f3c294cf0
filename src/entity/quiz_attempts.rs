//! 测验作答实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quiz_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub attempt_number: i32,
    pub score: Option<f64>,
    pub total_points: f64,
    pub earned_points: f64,
    pub is_passed: bool,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub time_spent: i64,
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
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::quiz_responses::Entity")]
    Responses,
}

impl Related<super::quizzes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::quiz_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_attempt(self) -> crate::models::quizzes::entities::QuizAttempt {
        crate::models::quizzes::entities::QuizAttempt {
            id: self.id,
            quiz_id: self.quiz_id,
            user_id: self.user_id,
            attempt_number: self.attempt_number,
            score: self.score,
            total_points: self.total_points,
            earned_points: self.earned_points,
            is_passed: self.is_passed,
            started_at: super::ts_to_datetime(self.started_at),
            completed_at: super::opt_ts_to_datetime(self.completed_at),
            time_spent: self.time_spent,
        }
    }
}
