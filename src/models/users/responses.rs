use super::entities::User;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserResponse {
    pub user: User,
}

// 用户详情（含学习统计）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserDetailResponse {
    pub user: User,
    pub department_name: Option<String>,
    pub total_enrollments: i64,
    pub completed_courses: i64,
    pub quiz_attempts: i64,
}

// 用户列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

// 用户统计
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub new_users_this_month: i64,
    pub users_by_role: Vec<RoleCount>,
}
