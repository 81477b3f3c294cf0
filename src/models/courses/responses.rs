use serde::Serialize;
use ts_rs::TS;

use super::entities::Course;
use crate::models::common::PaginationInfo;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListResponse {
    pub items: Vec<Course>,
    pub pagination: PaginationInfo,
}

// 课程详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseDetailResponse {
    pub course: Course,
    pub category_name: Option<String>,
    pub module_count: i64,
    pub enrollment_count: i64,
    pub is_enrolled: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct PopularCourse {
    pub course_id: i64,
    pub title: String,
    pub enrollment_count: i64,
}

// 课程统计
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseStatsResponse {
    pub total_courses: i64,
    pub by_status: Vec<NamedCount>,
    pub by_category: Vec<NamedCount>,
    pub by_difficulty: Vec<NamedCount>,
    pub most_popular: Vec<PopularCourse>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct BulkEnrollFailure {
    pub user_id: i64,
    pub reason: String,
}

// 批量选课结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct BulkEnrollResponse {
    pub success_count: i64,
    pub failure_count: i64,
    pub failures: Vec<BulkEnrollFailure>,
}
