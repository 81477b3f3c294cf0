use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::requests::{ChangePasswordRequest, ForgotPasswordRequest, ResetPasswordRequest},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::flush_user_cache;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::random_code::generate_url_safe_token;
use crate::utils::validate::validate_password_simple;

use super::AuthService;
use super::mail::OutgoingMail;

fn policy_violation(message: String) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
        ErrorCode::PasswordPolicyViolation,
        message,
    ))
}

/// 无论邮箱是否存在都返回相同结果
pub async fn handle_forgot_password(
    service: &AuthService,
    body: ForgotPasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if let Some(user) = storage.get_user_by_email(body.email.trim()).await?
        && user.is_active
    {
        let valid_minutes = service.get_config().jwt.reset_token_expiry;
        let token = generate_url_safe_token(48);
        let expires_at = chrono::Utc::now().timestamp() + valid_minutes * 60;
        storage.set_reset_token(user.id, &token, expires_at).await?;

        OutgoingMail::password_reset(&user.email, &token, valid_minutes).log();
        info!("Password reset requested for user {}", user.id);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "If the email exists, a password reset link has been sent",
    )))
}

pub async fn handle_reset_password(
    service: &AuthService,
    body: ResetPasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_password_simple(&body.new_password) {
        return Ok(policy_violation(msg));
    }

    let storage = service.get_storage(request)?;
    let now = chrono::Utc::now().timestamp();

    let Some(user) = storage.get_user_by_reset_token(body.token.trim(), now).await? else {
        warn!("Invalid or expired password reset token used");
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::InvalidToken,
            "Invalid or expired reset token",
        )));
    };

    let password_hash = hash_password(&body.new_password)?;
    storage.update_password(user.id, &password_hash).await?;
    flush_user_cache(request).await;

    info!("Password reset for user {}", user.id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::User, user.id)
            .by(user.id)
            .details(serde_json::json!({ "password": "reset" })),
    )
    .await;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Password has been reset",
    )))
}

pub async fn handle_change_password(
    service: &AuthService,
    body: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    // 缓存中的用户不含密码哈希，需要重新读取
    let Some(user) = storage.get_user_by_id(current.id).await? else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        )));
    };

    if !verify_password(&body.current_password, &user.password_hash) {
        warn!("User {} supplied a wrong current password", user.id);
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Current password is incorrect",
        )));
    }

    if let Err(msg) = validate_password_simple(&body.new_password) {
        return Ok(policy_violation(msg));
    }

    let password_hash = hash_password(&body.new_password)?;
    storage.update_password(user.id, &password_hash).await?;
    flush_user_cache(request).await;

    info!("User {} changed password", user.id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::User, user.id)
            .details(serde_json::json!({ "password": "changed" })),
    )
    .await;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Password changed successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{PASSWORD, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_change_password_checks_current() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "alice", UserRole::Employee).await;
        let service = AuthService::with_storage(storage.clone());
        let req = request_as(&user, &storage);

        let resp = handle_change_password(
            &service,
            ChangePasswordRequest {
                current_password: "nope".into(),
                new_password: "N3wPassword".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = handle_change_password(
            &service,
            ChangePasswordRequest {
                current_password: PASSWORD.into(),
                new_password: "N3wPassword".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = raw.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert!(verify_password("N3wPassword", &stored.password_hash));
    }

    #[actix_web::test]
    async fn test_forgot_then_reset() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "alice", UserRole::Employee).await;
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default().to_http_request();

        let resp = handle_forgot_password(
            &service,
            ForgotPasswordRequest {
                email: "unknown@example.com".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // 直接写入已知令牌模拟邮件中的链接
        let expires = chrono::Utc::now().timestamp() + 600;
        raw.set_reset_token_impl(user.id, "known-token", expires)
            .await
            .unwrap();

        let resp = handle_reset_password(
            &service,
            ResetPasswordRequest {
                token: "wrong-token".into(),
                new_password: "R3setPassword".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = handle_reset_password(
            &service,
            ResetPasswordRequest {
                token: "known-token".into(),
                new_password: "R3setPassword".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // 令牌只能使用一次
        let resp = handle_reset_password(
            &service,
            ResetPasswordRequest {
                token: "known-token".into(),
                new_password: "An0therPassword".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
