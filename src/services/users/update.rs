use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, flush_user_cache, not_found, validation_failed};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = update_data.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;

    if let Some(department_id) = update_data.department_id
        && storage.get_department_by_id(department_id).await?.is_none()
    {
        return Ok(bad_request(
            ErrorCode::DepartmentNotFound,
            "Department not found",
        ));
    }

    let Some(user) = storage.update_user(user_id, update_data).await? else {
        return Ok(not_found(ErrorCode::UserNotFound, "User not found"));
    };

    // 角色或状态可能变化，缓存的用户需要失效
    flush_user_cache(request).await;
    info!("User {} updated", user.id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::User, user.id)
            .details(serde_json::json!({ "role": user.role, "is_active": user.is_active })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "User information updated successfully",
    )))
}
