use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::users::requests::{UpdateProfileRequest, UpdateUserRequest};
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{flush_user_cache, not_found, validation_failed};

pub async fn get_profile(
    _service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "Profile retrieved successfully",
    )))
}

/// 只能修改姓名、电话和头像
pub async fn update_profile(
    service: &UserService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = RequireJWT::current_user(request)?;

    let update = UpdateUserRequest::from(update_data);
    if let Err(msg) = update.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    let Some(user) = storage.update_user(current.id, update).await? else {
        return Ok(not_found(ErrorCode::UserNotFound, "User not found"));
    };

    flush_user_cache(request).await;
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::User, user.id)
            .details(serde_json::json!({ "profile": true })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "Profile updated successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::seed_user;

    #[actix_web::test]
    async fn test_profile_update_keeps_role() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "emp", UserRole::Employee).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&user, &storage);

        let update: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Renamed",
            "role": "admin"
        }))
        .unwrap();
        let resp = update_profile(&service, update, &req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["first_name"], "Renamed");
        assert_eq!(body["data"]["user"]["role"], "employee");
    }
}
