use super::entities::UserRole;
use serde::Deserialize;
use ts_rs::TS;

use crate::utils::validate::{
    validate_email, validate_name, validate_password_simple, validate_phone, validate_username,
};

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<UserSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserSortField {
    CreatedAt,
    Name,
    Email,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum SortOrder {
    Asc,
    Desc,
}

// 用户创建请求（管理员）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub department_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_username(&self.username).map_err(str::to_string)?;
        validate_email(&self.email).map_err(str::to_string)?;
        validate_password_simple(&self.password)?;
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        if let Some(ref phone) = self.phone {
            validate_phone(phone).map_err(str::to_string)?;
        }
        Ok(())
    }
}

// 用户更新请求（管理员）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<UserRole>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref first_name) = self.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(ref last_name) = self.last_name {
            validate_name("last_name", last_name)?;
        }
        if let Some(ref phone) = self.phone {
            validate_phone(phone).map_err(str::to_string)?;
        }
        Ok(())
    }
}

// 当前用户资料更新请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUserRequest {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            avatar_url: req.avatar_url,
            ..Default::default()
        }
    }
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<UserSortField>,
    pub sort_order: Option<SortOrder>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        Self {
            page: params.page,
            size: params.size,
            role: params.role,
            department_id: params.department_id,
            is_active: params.is_active,
            search: params.search,
            sort_by: params.sort_by,
            sort_order: params.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateUserRequest {
        CreateUserRequest {
            username: "jane_doe".into(),
            email: "jane@example.com".into(),
            password: "Str0ngPassw0rd".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: Some("+1234567890".into()),
            role: UserRole::Employee,
            department_id: None,
            is_active: true,
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(valid_request().validate().is_ok());

        let mut bad = valid_request();
        bad.email = "not-an-email".into();
        assert!(bad.validate().is_err());

        let mut bad = valid_request();
        bad.password = "short".into();
        assert!(bad.validate().is_err());

        let mut bad = valid_request();
        bad.first_name = "   ".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_profile_update_cannot_change_role() {
        let profile = UpdateProfileRequest {
            first_name: Some("New".into()),
            last_name: None,
            phone: None,
            avatar_url: None,
        };
        let update: UpdateUserRequest = profile.into();
        assert!(update.role.is_none());
        assert!(update.is_active.is_none());
        assert_eq!(update.first_name.as_deref(), Some("New"));
    }
}
