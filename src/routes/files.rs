use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::files::requests::UploadQuery;
use crate::models::rbac::entities::Permission;
use crate::services::FileService;

// 懒加载的全局 FileService 实例
static FILE_SERVICE: Lazy<FileService> = Lazy::new(FileService::new_lazy);

pub async fn handle_upload(
    request: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    FILE_SERVICE
        .handle_upload(&request, query.into_inner(), payload)
        .await
}

// 配置路由
pub fn configure_file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/files")
            .wrap(middlewares::RateLimit::file_upload())
            .wrap(RequirePermission::new(Permission::FilesUpload))
            .wrap(middlewares::RequireJWT)
            .route("/upload", web::post().to(handle_upload)),
    );
}
