/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>` 中的 access token，
 * 并把当前用户放入请求扩展，供后续中间件和处理程序使用。
 *
 * ```rust,ignore
 * web::scope("/courses")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_courses))
 * ```
 *
 * 用户信息按 token 缓存（键 `user:{token}`），注销、改密或用户被修改时失效。
 * 缓存未命中时回源数据库，已停用或已删除的用户会被拒绝。
 */

use crate::cache::{CacheResult, ObjectCache, user_cache_key};
use crate::config::AppConfig;
use crate::errors::LmsError;
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败的原因
#[derive(Debug)]
enum AuthFailure {
    Unauthorized(&'static str),
    Inactive,
    Internal,
}

impl AuthFailure {
    fn status(&self) -> StatusCode {
        match self {
            AuthFailure::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthFailure::Inactive => StatusCode::FORBIDDEN,
            AuthFailure::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AuthFailure::Unauthorized(_) => ErrorCode::Unauthorized,
            AuthFailure::Inactive => ErrorCode::UserInactive,
            AuthFailure::Internal => ErrorCode::InternalServerError,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthFailure::Unauthorized(msg) => msg,
            AuthFailure::Inactive => "User account is inactive",
            AuthFailure::Internal => "Internal server error",
        }
    }
}

/// 从请求头中取出 Bearer token
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req.request())
        .ok_or(AuthFailure::Unauthorized("Missing or invalid Authorization header"))?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::Unauthorized("Invalid or expired token")
    })?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Cache not found in app data");
            AuthFailure::Internal
        })?;

    let cache_key = user_cache_key(token);
    match cache.get_json::<User>(&cache_key).await {
        CacheResult::Found(user) => return Ok(user),
        CacheResult::ExistsButNoValue => cache.remove(&cache_key).await,
        CacheResult::NotFound => {}
    }

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            AuthFailure::Internal
        })?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthFailure::Unauthorized("Invalid token subject"))?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", user_id, e);
            AuthFailure::Internal
        })?
        .ok_or(AuthFailure::Unauthorized("User not found"))?;

    if !user.is_active {
        return Err(AuthFailure::Inactive);
    }

    cache
        .insert_json(cache_key, &user, AppConfig::get().cache.default_ttl)
        .await;

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                let res = srv.call(req).await?.map_into_left_body();
                return Ok(res);
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(failure) => {
                    info!(
                        "JWT authentication failed for request to {}: {:?}",
                        req.path(),
                        failure
                    );
                    Ok(req.into_response(
                        create_error_response(failure.status(), failure.code(), failure.message())
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 当前用户（须在 RequireJWT 之后调用）
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role.clone())
    }

    /// 当前用户，缺失时返回认证错误
    pub fn current_user(req: &HttpRequest) -> Result<User, LmsError> {
        Self::extract_user_claims(req)
            .ok_or_else(|| LmsError::authentication("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn test_failure_status_mapping() {
        assert_eq!(
            AuthFailure::Unauthorized("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthFailure::Inactive.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthFailure::Inactive.code(), ErrorCode::UserInactive);
    }

    #[test]
    fn test_current_user_missing() {
        let req = TestRequest::default().to_http_request();
        assert!(RequireJWT::current_user(&req).is_err());
    }
}
