use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, flush_user_cache, not_found};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = RequireJWT::current_user(request)?;

    // 禁止删除当前用户
    if current.id == user_id {
        return Ok(bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        ));
    }

    let storage = service.get_storage(request)?;
    if !storage.soft_delete_user(user_id).await? {
        return Ok(not_found(ErrorCode::UserNotFound, "User not found"));
    }

    flush_user_cache(request).await;
    info!("User {} deleted by {}", user_id, current.id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::User, user_id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "User deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::seed_user;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_cannot_delete_self() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&admin, &storage);

        let resp = delete_user(&service, admin.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_soft_delete_twice() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let target = seed_user(&raw, "leaver", UserRole::Employee).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&admin, &storage);

        let resp = delete_user(&service, target.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = delete_user(&service, target.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
