use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, validation_failed};
use crate::utils::password::hash_password;

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = user_data.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    user_data.username = user_data.username.trim().to_string();
    user_data.email = user_data.email.trim().to_string();

    if storage
        .get_user_by_username(&user_data.username)
        .await?
        .is_some()
    {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists",
        )));
    }

    if storage.get_user_by_email(&user_data.email).await?.is_some() {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        )));
    }

    if let Some(department_id) = user_data.department_id
        && storage.get_department_by_id(department_id).await?.is_none()
    {
        return Ok(bad_request(
            ErrorCode::DepartmentNotFound,
            "Department not found",
        ));
    }

    user_data.password = hash_password(&user_data.password)?;

    // 管理员创建的账号视为已验证
    let user = storage.create_user(user_data, None).await?;

    info!(
        "User {} created by {:?}",
        user.username,
        RequireJWT::extract_user_id(request)
    );
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::User, user.id)
            .details(serde_json::json!({ "username": user.username, "role": user.role })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        UserResponse { user },
        "User created successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::seed_user;
    use actix_web::http::StatusCode;

    fn request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            email: format!("{username}@corp.example"),
            password: "Str0ngPassw0rd".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            phone: None,
            role: UserRole::ResourcePersonnel,
            department_id: None,
            is_active: true,
        }
    }

    #[actix_web::test]
    async fn test_admin_creates_user_with_role() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&admin, &storage);

        let resp = create_user(&service, request("author"), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["role"], "resource_personnel");
        assert_eq!(body["data"]["user"]["is_verified"], true);

        let resp = create_user(&service, request("author"), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_unknown_department_rejected() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&admin, &storage);

        let mut body = request("orphan");
        body.department_id = Some(99);
        let resp = create_user(&service, body, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
