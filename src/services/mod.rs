//! 业务逻辑层
//!
//! 每个业务域一个服务，服务本身无状态，存储和缓存从请求的 app data 中获取。

pub mod audit;
pub mod auth;
pub mod categories;
pub mod courses;
pub mod departments;
pub mod files;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod roles;
pub mod users;

pub use audit::AuditService;
pub use auth::AuthService;
pub use categories::CategoryService;
pub use courses::CourseService;
pub use departments::DepartmentService;
pub use files::FileService;
pub use modules::ModuleService;
pub use progress::ProgressService;
pub use quizzes::QuizService;
pub use roles::RoleService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::{error, warn};

use crate::cache::{ObjectCache, user_cache_key};
use crate::errors::{LmsError, Result};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 声明一个持有可选存储的服务
///
/// 生成 `new_lazy()`、`with_storage()` 和 `get_storage()`。
#[macro_export]
macro_rules! declare_service {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            storage: Option<std::sync::Arc<dyn $crate::storage::Storage>>,
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self { storage: None }
            }

            pub fn with_storage(storage: std::sync::Arc<dyn $crate::storage::Storage>) -> Self {
                Self {
                    storage: Some(storage),
                }
            }

            pub(crate) fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> $crate::errors::Result<std::sync::Arc<dyn $crate::storage::Storage>> {
                match &self.storage {
                    Some(storage) => Ok(storage.clone()),
                    None => $crate::services::storage_from_request(request),
                }
            }
        }
    };
}

/// 从 app data 中取出存储
pub(crate) fn storage_from_request(request: &HttpRequest) -> Result<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            LmsError::database_connection("Storage not found in app data")
        })
}

fn cache_from_request(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    let cache = request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());
    if cache.is_none() {
        warn!("Cache not found in app data, skip invalidation");
    }
    cache
}

/// 移除某个 token 对应的用户缓存
pub(crate) async fn forget_cached_token(request: &HttpRequest, token: &str) {
    if let Some(cache) = cache_from_request(request) {
        cache.remove(&user_cache_key(token)).await;
    }
}

/// 用户资料、角色或密码变化后清空用户缓存
pub(crate) async fn flush_user_cache(request: &HttpRequest) {
    if let Some(cache) = cache_from_request(request) {
        cache.invalidate_all().await;
    }
}

/// 422 校验失败响应
pub(crate) fn validation_failed(message: impl Into<String>) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
        ErrorCode::ValidationFailed,
        message,
    ))
}

/// 404 响应
pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 400 业务规则响应
pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

#[cfg(test)]
pub(crate) mod testing {
    //! 服务层测试工具
    use actix_web::{HttpMessage, HttpRequest, test::TestRequest, web};
    use std::sync::Arc;

    use crate::models::users::entities::User;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    pub async fn memory_storage() -> (SeaOrmStorage, Arc<dyn Storage>) {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        (storage, shared)
    }

    /// 带当前用户和存储的请求
    pub fn request_as(user: &User, storage: &Arc<dyn Storage>) -> HttpRequest {
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(user.clone());
        req
    }

    pub async fn body_json(resp: actix_web::HttpResponse) -> serde_json::Value {
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
