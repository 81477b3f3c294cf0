use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{
    ApiResponse, ErrorCode,
    auth::requests::RegisterRequest,
    users::{entities::UserRole, requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::validation_failed;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_url_safe_token;

use super::AuthService;
use super::mail::OutgoingMail;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 1. 校验字段
    if let Err(msg) = register_request.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;

    // 2. 检查用户名和邮箱是否已存在
    if let Err(response) = check_user_exists(&storage, &register_request).await? {
        return Ok(response);
    }

    // 3. 哈希密码，新用户一律为普通员工
    let password_hash = hash_password(&register_request.password)?;
    let verification_token = generate_url_safe_token(48);
    let create_request = CreateUserRequest {
        username: register_request.username.trim().to_string(),
        email: register_request.email.trim().to_string(),
        password: password_hash,
        first_name: register_request.first_name.trim().to_string(),
        last_name: register_request.last_name.trim().to_string(),
        phone: register_request.phone,
        role: UserRole::Employee,
        department_id: None,
        is_active: true,
    };

    // 4. 创建用户
    let user = storage
        .create_user(create_request, Some(verification_token.clone()))
        .await?;

    OutgoingMail::verification(&user.email, &verification_token).log();
    info!("User {} registered", user.username);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::User, user.id)
            .by(user.id)
            .details(serde_json::json!({ "username": user.username, "self_registered": true })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        UserResponse { user },
        "Registration successful",
    )))
}

async fn check_user_exists(
    storage: &Arc<dyn Storage>,
    register_request: &RegisterRequest,
) -> crate::errors::Result<Result<(), HttpResponse>> {
    if storage
        .get_user_by_username(register_request.username.trim())
        .await?
        .is_some()
    {
        return Ok(Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists",
        ))));
    }

    if storage
        .get_user_by_email(register_request.email.trim())
        .await?
        .is_some()
    {
        return Ok(Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        ))));
    }

    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, memory_storage};
    use actix_web::http::StatusCode;

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "Str0ngPassw0rd".into(),
            first_name: "New".into(),
            last_name: "Hire".into(),
            phone: None,
        }
    }

    #[actix_web::test]
    async fn test_register_creates_unverified_employee() {
        let (_, storage) = memory_storage().await;
        let service = AuthService::with_storage(storage.clone());
        let req = actix_web::test::TestRequest::default().to_http_request();

        let resp = handle_register(&service, register_request("new_hire", "new@example.com"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["role"], "employee");
        assert_eq!(body["data"]["user"]["is_verified"], false);
        assert!(body["data"]["user"].get("password_hash").is_none());
    }

    #[actix_web::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let (_, storage) = memory_storage().await;
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default().to_http_request();

        handle_register(&service, register_request("taken", "taken@example.com"), &req)
            .await
            .unwrap();

        let resp = handle_register(&service, register_request("taken", "other@example.com"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = handle_register(&service, register_request("other", "taken@example.com"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_weak_password_is_unprocessable() {
        let (_, storage) = memory_storage().await;
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default().to_http_request();

        let mut body = register_request("weak", "weak@example.com");
        body.password = "password".into();
        let resp = handle_register(&service, body, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
