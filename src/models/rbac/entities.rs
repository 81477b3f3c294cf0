use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserRole;

/// 权限点
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/rbac.ts")]
pub enum Permission {
    #[serde(rename = "users.view")]
    UsersView,
    #[serde(rename = "users.manage")]
    UsersManage,
    #[serde(rename = "roles.manage")]
    RolesManage,
    #[serde(rename = "departments.manage")]
    DepartmentsManage,
    #[serde(rename = "categories.manage")]
    CategoriesManage,
    #[serde(rename = "courses.manage")]
    CoursesManage,
    #[serde(rename = "courses.publish")]
    CoursesPublish,
    #[serde(rename = "content.manage")]
    ContentManage,
    #[serde(rename = "quizzes.manage")]
    QuizzesManage,
    #[serde(rename = "enrollments.manage")]
    EnrollmentsManage,
    #[serde(rename = "reports.view")]
    ReportsView,
    #[serde(rename = "files.upload")]
    FilesUpload,
}

impl Permission {
    pub fn all() -> &'static [Permission] {
        use Permission::*;
        &[
            UsersView,
            UsersManage,
            RolesManage,
            DepartmentsManage,
            CategoriesManage,
            CoursesManage,
            CoursesPublish,
            ContentManage,
            QuizzesManage,
            EnrollmentsManage,
            ReportsView,
            FilesUpload,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UsersView => "users.view",
            Permission::UsersManage => "users.manage",
            Permission::RolesManage => "roles.manage",
            Permission::DepartmentsManage => "departments.manage",
            Permission::CategoriesManage => "categories.manage",
            Permission::CoursesManage => "courses.manage",
            Permission::CoursesPublish => "courses.publish",
            Permission::ContentManage => "content.manage",
            Permission::QuizzesManage => "quizzes.manage",
            Permission::EnrollmentsManage => "enrollments.manage",
            Permission::ReportsView => "reports.view",
            Permission::FilesUpload => "files.upload",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 角色（roles 表）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/rbac.ts")]
pub struct Role {
    pub id: i64,
    pub name: UserRole,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_serializes_as_dotted_name() {
        for permission in Permission::all() {
            let json = serde_json::to_string(permission).unwrap();
            assert_eq!(json, format!("\"{}\"", permission.as_str()));
        }
    }
}
