use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::declare_service;
use crate::models::{ApiResponse, rbac::responses::RoleListResponse};

declare_service!(RoleService);

impl RoleService {
    // 角色及其权限
    pub async fn list_roles(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let items = storage.list_roles().await?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            RoleListResponse { items },
            "Role list retrieved successfully",
        )))
    }
}
