use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use crate::middlewares::RequireJWT;
use crate::models::auth::{
    requests::RefreshTokenRequest,
    responses::{RefreshTokenResponse, UserInfoResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn refresh_rejected(message: &str) -> HttpResponse {
    // 清除无效的 refresh token cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(ErrorCode::InvalidToken, message))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    body: RefreshTokenRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 请求体优先，其次是 cookie
    let Some(refresh_token) = body
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| JwtUtils::extract_refresh_token_from_cookie(request))
    else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Refresh token is required",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            info!("Refresh token rejected: {}", e);
            return Ok(refresh_rejected(
                "Login expired or invalid, please login again",
            ));
        }
    };

    let Ok(user_id) = claims.sub.parse::<i64>() else {
        return Ok(refresh_rejected("Invalid token subject"));
    };

    // 角色以数据库中的最新值为准
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!("Refresh token used for missing or inactive user {}", user_id);
            return Ok(refresh_rejected("User not found or inactive"));
        }
    };

    let access_token = JwtUtils::generate_access_token(user.id, &user.role.to_string())
        .map_err(|e| crate::errors::LmsError::authentication(format!("Token error: {e}")))?;

    let response = RefreshTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: service.get_config().jwt.access_token_expiry * 60,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Token refreshed successfully",
    )))
}

pub async fn handle_get_user(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let permissions = user.role.permissions().to_vec();
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user, permissions },
        "User information retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage};
    use crate::storage::sea_orm_storage::fixtures::seed_user;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_refresh_from_body() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "alice", UserRole::Hr).await;
        let pair = user.generate_token_pair().unwrap();
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default().to_http_request();

        let resp = handle_refresh_token(
            &service,
            RefreshTokenRequest {
                refresh_token: Some(pair.refresh_token),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let claims =
            JwtUtils::verify_access_token(body["data"]["access_token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role, "hr");
    }

    #[actix_web::test]
    async fn test_access_token_cannot_refresh() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "alice", UserRole::Employee).await;
        let pair = user.generate_token_pair().unwrap();
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default().to_http_request();

        let resp = handle_refresh_token(
            &service,
            RefreshTokenRequest {
                refresh_token: Some(pair.access_token),
            },
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = handle_refresh_token(&service, RefreshTokenRequest::default(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_refresh_from_cookie() {
        let (raw, storage) = memory_storage().await;
        let user = seed_user(&raw, "alice", UserRole::Employee).await;
        let pair = user.generate_token_pair().unwrap();
        let service = AuthService::with_storage(storage);
        let req = actix_web::test::TestRequest::default()
            .cookie(JwtUtils::create_refresh_token_cookie(&pair.refresh_token))
            .to_http_request();

        let resp = handle_refresh_token(&service, RefreshTokenRequest::default(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
