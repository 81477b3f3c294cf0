use serde::Serialize;
use ts_rs::TS;

use super::entities::Enrollment;
use crate::models::common::PaginationInfo;
use crate::models::users::entities::User;

// 课程下的选课记录（管理视图）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct CourseEnrollmentItem {
    pub enrollment: Enrollment,
    pub user: User,
    pub is_overdue: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct CourseEnrollmentListResponse {
    pub items: Vec<CourseEnrollmentItem>,
    pub pagination: PaginationInfo,
}

// 我的课程进度
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct CourseProgressSummary {
    pub enrollment: Enrollment,
    pub course_title: String,
    pub is_overdue: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct CourseProgressListResponse {
    pub items: Vec<CourseProgressSummary>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct ModuleProgressItem {
    pub module_id: i64,
    pub title: String,
    pub order_index: i32,
    pub is_mandatory: bool,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 单门课程的模块完成情况
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct CourseProgressDetailResponse {
    pub enrollment: Enrollment,
    pub course_title: String,
    pub is_overdue: bool,
    pub total_modules: i64,
    pub completed_modules: i64,
    pub modules: Vec<ModuleProgressItem>,
}
