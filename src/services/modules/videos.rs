use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ModuleService, visible_course};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    modules::{
        requests::{CreateVideoRequest, UpdateVideoRequest},
        responses::VideoListResponse,
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{not_found, validation_failed};

pub async fn list_videos(
    service: &ModuleService,
    module_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let visible = match storage.get_module_by_id(module_id).await? {
        Some(module) => visible_course(&storage, &user, module.course_id)
            .await?
            .is_some(),
        None => false,
    };
    if !visible {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let items = storage.list_videos(module_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        VideoListResponse { items },
        "Video list retrieved successfully",
    )))
}

pub async fn create_video(
    service: &ModuleService,
    module_id: i64,
    body: CreateVideoRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_module_by_id(module_id).await?.is_none() {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let video = storage.create_video(module_id, body).await?;
    info!("Video {} attached to module {}", video.id, module_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Video, video.id)
            .details(serde_json::json!({ "module_id": module_id, "title": video.title })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        video,
        "Video created successfully",
    )))
}

pub async fn update_video(
    service: &ModuleService,
    video_id: i64,
    body: UpdateVideoRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    let Some(video) = storage.update_video(video_id, body).await? else {
        return Ok(not_found(ErrorCode::VideoNotFound, "Video not found"));
    };
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Video, video.id)
            .details(serde_json::json!({ "title": video.title })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        video,
        "Video updated successfully",
    )))
}

pub async fn delete_video(
    service: &ModuleService,
    video_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if !storage.delete_video(video_id).await? {
        return Ok(not_found(ErrorCode::VideoNotFound, "Video not found"));
    }

    info!("Video {} deleted", video_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Video, video_id),
    )
    .await;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Video deleted successfully",
    )))
}
