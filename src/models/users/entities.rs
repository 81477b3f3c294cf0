use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::rbac::entities::Permission;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Admin,             // 管理员
    Hr,                // 人力资源
    ResourcePersonnel, // 课程资源人员
    Employee,          // 普通员工
}

impl UserRole {
    pub const ADMIN: &'static str = "admin";
    pub const HR: &'static str = "hr";
    pub const RESOURCE_PERSONNEL: &'static str = "resource_personnel";
    pub const EMPLOYEE: &'static str = "employee";

    pub fn all_roles() -> &'static [&'static UserRole] {
        &[
            &Self::Admin,
            &Self::Hr,
            &Self::ResourcePersonnel,
            &Self::Employee,
        ]
    }

    /// 角色是否拥有指定权限，管理员总是通过
    pub fn has_permission(&self, permission: Permission) -> bool {
        matches!(self, UserRole::Admin) || self.permissions().contains(&permission)
    }

    /// 角色的权限集合
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            UserRole::Admin => Permission::all(),
            UserRole::Hr => &[
                UsersView,
                UsersManage,
                DepartmentsManage,
                CoursesPublish,
                EnrollmentsManage,
                ReportsView,
            ],
            UserRole::ResourcePersonnel => &[
                CategoriesManage,
                CoursesManage,
                ContentManage,
                QuizzesManage,
                ReportsView,
                FilesUpload,
            ],
            UserRole::Employee => &[],
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "Invalid user role: '{s}'. Supported roles: admin, hr, resource_personnel, employee"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
            UserRole::Hr => write!(f, "{}", UserRole::HR),
            UserRole::ResourcePersonnel => write!(f, "{}", UserRole::RESOURCE_PERSONNEL),
            UserRole::Employee => write!(f, "{}", UserRole::EMPLOYEE),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::ADMIN => Ok(UserRole::Admin),
            UserRole::HR => Ok(UserRole::Hr),
            UserRole::RESOURCE_PERSONNEL => Ok(UserRole::ResourcePersonnel),
            UserRole::EMPLOYEE => Ok(UserRole::Employee),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub department_id: Option<i64>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(&self) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(self.id, &self.role.to_string())
            .map_err(|e| format!("Failed to generate token pair: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in UserRole::all_roles() {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(&parsed, *role);
        }
        assert!("instructor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_rejects_unknown() {
        let role: UserRole = serde_json::from_str(r#""resource_personnel""#).unwrap();
        assert_eq!(role, UserRole::ResourcePersonnel);
        assert!(serde_json::from_str::<UserRole>(r#""root""#).is_err());
    }

    #[test]
    fn test_admin_has_every_permission() {
        for permission in Permission::all() {
            assert!(UserRole::Admin.has_permission(*permission));
        }
    }

    #[test]
    fn test_employee_has_no_management_permission() {
        for permission in Permission::all() {
            assert!(!UserRole::Employee.has_permission(*permission));
        }
    }

    #[test]
    fn test_permission_matrix() {
        assert!(UserRole::Hr.has_permission(Permission::UsersManage));
        assert!(UserRole::Hr.has_permission(Permission::EnrollmentsManage));
        assert!(!UserRole::Hr.has_permission(Permission::QuizzesManage));
        assert!(UserRole::ResourcePersonnel.has_permission(Permission::QuizzesManage));
        assert!(UserRole::ResourcePersonnel.has_permission(Permission::FilesUpload));
        assert!(!UserRole::ResourcePersonnel.has_permission(Permission::CoursesPublish));
        assert!(!UserRole::ResourcePersonnel.has_permission(Permission::UsersView));
    }
}
