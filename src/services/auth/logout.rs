use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::require_jwt::bearer_token;
use crate::models::ApiResponse;
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{forget_cached_token, storage_from_request};
use crate::utils::jwt::JwtUtils;

/// 处理用户登出
///
/// 清除该 token 的用户缓存，并用过期的 refresh_token cookie 覆盖客户端的 cookie。
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    if let Some(token) = bearer_token(request) {
        forget_cached_token(request, token).await;

        // 登出不经过鉴权中间件，仅有效的 access token 才记审计
        if let Some(user_id) = JwtUtils::verify_access_token(token)
            .ok()
            .and_then(|claims| claims.sub.parse::<i64>().ok())
            && let Ok(storage) = storage_from_request(request)
        {
            record_audit(
                &storage,
                request,
                AuditEvent::new(AuditAction::Logout, AuditEntity::User, user_id).by(user_id),
            )
            .await;
        }
    }

    let empty_cookie = JwtUtils::create_empty_refresh_token_cookie();

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::<()>::success_empty("Logout successful")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheResult, ObjectCache, create_object_cache, user_cache_key};
    use actix_web::web;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_logout_forgets_cached_user() {
        let cache: Arc<dyn ObjectCache> = create_object_cache().await.unwrap();
        cache
            .insert_raw(user_cache_key("tok"), "{}".into(), 60)
            .await;

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", "Bearer tok"))
            .app_data(web::Data::new(cache.clone()))
            .to_http_request();
        let resp = handle_logout(&req).await.unwrap();

        assert!(resp.status().is_success());
        let cookie = resp
            .cookies()
            .find(|c| c.name() == "refresh_token")
            .unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cache.get_raw(&user_cache_key("tok")).await, CacheResult::NotFound);
    }
}
