use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::modules::requests::{
    CreateDocumentRequest, CreateModuleRequest, CreateVideoRequest, ReorderModulesRequest,
    UpdateModuleRequest, UpdateVideoRequest,
};
use crate::models::rbac::entities::Permission;
use crate::services::ModuleService;
use crate::utils::{SafeCourseIdI64, SafeIDI64};

static MODULE_SERVICE: Lazy<ModuleService> = Lazy::new(ModuleService::new_lazy);

fn manage() -> RequirePermission {
    RequirePermission::new(Permission::ContentManage)
}

// 课程下的模块
pub async fn list_modules(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.list_modules(course_id.0, &req).await
}

pub async fn create_module(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<CreateModuleRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .create_module(course_id.0, body.into_inner(), &req)
        .await
}

pub async fn reorder_modules(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<ReorderModulesRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .reorder_modules(course_id.0, body.into_inner(), &req)
        .await
}

// 单个模块
pub async fn get_module(req: HttpRequest, module_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.get_module(module_id.0, &req).await
}

pub async fn update_module(
    req: HttpRequest,
    module_id: SafeIDI64,
    body: web::Json<UpdateModuleRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .update_module(module_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_module(req: HttpRequest, module_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.delete_module(module_id.0, &req).await
}

// 文档
pub async fn list_documents(req: HttpRequest, module_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.list_documents(module_id.0, &req).await
}

pub async fn create_document(
    req: HttpRequest,
    module_id: SafeIDI64,
    body: web::Json<CreateDocumentRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .create_document(module_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_document(
    req: HttpRequest,
    document_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.delete_document(document_id.0, &req).await
}

pub async fn download_document(
    req: HttpRequest,
    document_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.download_document(document_id.0, &req).await
}

// 视频
pub async fn list_videos(req: HttpRequest, module_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.list_videos(module_id.0, &req).await
}

pub async fn create_video(
    req: HttpRequest,
    module_id: SafeIDI64,
    body: web::Json<CreateVideoRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .create_video(module_id.0, body.into_inner(), &req)
        .await
}

pub async fn update_video(
    req: HttpRequest,
    video_id: SafeIDI64,
    body: web::Json<UpdateVideoRequest>,
) -> ActixResult<HttpResponse> {
    MODULE_SERVICE
        .update_video(video_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_video(req: HttpRequest, video_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MODULE_SERVICE.delete_video(video_id.0, &req).await
}

/// 课程下的模块列表，需先于 /api/v1/courses 注册
pub fn configure_course_module_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses/{course_id}/modules")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_modules))
            .route("", web::post().to(create_module).wrap(manage()))
            .route("/reorder", web::put().to(reorder_modules).wrap(manage())),
    );
}

pub fn configure_module_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/modules")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::get().to(get_module))
            .route("/{id}", web::put().to(update_module).wrap(manage()))
            .route("/{id}", web::delete().to(delete_module).wrap(manage()))
            .route("/{id}/documents", web::get().to(list_documents))
            .route(
                "/{id}/documents",
                web::post().to(create_document).wrap(manage()),
            )
            .route("/{id}/videos", web::get().to(list_videos))
            .route("/{id}/videos", web::post().to(create_video).wrap(manage())),
    )
    .service(
        web::scope("/api/v1/documents")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::delete().to(delete_document).wrap(manage()))
            .route("/{id}/download", web::get().to(download_document)),
    )
    .service(
        web::scope("/api/v1/videos")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::put().to(update_video).wrap(manage()))
            .route("/{id}", web::delete().to(delete_video).wrap(manage())),
    );
}
