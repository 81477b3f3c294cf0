use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, auth::requests::VerifyEmailRequest};
use crate::services::flush_user_cache;

use super::AuthService;

pub async fn handle_verify_email(
    service: &AuthService,
    body: VerifyEmailRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;

    if user.is_verified {
        return Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
            "Email already verified",
        )));
    }

    let storage = service.get_storage(request)?;
    if !storage.verify_email(user.id, body.token.trim()).await? {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::InvalidToken,
            "Invalid verification token",
        )));
    }

    flush_user_cache(request).await;
    info!("User {} verified email", user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Email verified successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::services::testing::{memory_storage, request_as};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_verify_email_with_token() {
        let (raw, storage) = memory_storage().await;
        let user = raw
            .create_user_impl(
                CreateUserRequest {
                    username: "carol".into(),
                    email: "carol@example.com".into(),
                    password: "hash".into(),
                    first_name: "Carol".into(),
                    last_name: "C".into(),
                    phone: None,
                    role: UserRole::Employee,
                    department_id: None,
                    is_active: true,
                },
                Some("verify-me".into()),
            )
            .await
            .unwrap();
        let service = AuthService::with_storage(storage.clone());
        let req = request_as(&user, &storage);

        let resp = handle_verify_email(
            &service,
            VerifyEmailRequest {
                token: "bad".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = handle_verify_email(
            &service,
            VerifyEmailRequest {
                token: "verify-me".into(),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(raw.get_user_by_id_impl(user.id).await.unwrap().unwrap().is_verified);
    }
}
