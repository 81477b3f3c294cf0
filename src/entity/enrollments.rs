//! 选课实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub enrolled_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub progress_percentage: f64,
    pub status: String,
    pub due_date: Option<i64>,
    pub assigned_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_enrollment(self) -> crate::models::enrollments::entities::Enrollment {
        use super::{opt_ts_to_datetime, ts_to_datetime};
        use crate::models::enrollments::entities::{Enrollment, EnrollmentStatus};

        Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            enrolled_at: ts_to_datetime(self.enrolled_at),
            started_at: opt_ts_to_datetime(self.started_at),
            completed_at: opt_ts_to_datetime(self.completed_at),
            progress_percentage: self.progress_percentage,
            status: self.status.parse().unwrap_or(EnrollmentStatus::Enrolled),
            due_date: opt_ts_to_datetime(self.due_date),
            assigned_by: self.assigned_by,
        }
    }
}
