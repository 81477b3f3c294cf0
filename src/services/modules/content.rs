use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::documents::remove_stored_file;
use super::{ModuleService, visible_course};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    modules::{
        requests::{CreateModuleRequest, ReorderModulesRequest, UpdateModuleRequest},
        responses::{ModuleDetailResponse, ModuleListResponse},
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, not_found, validation_failed};

pub async fn list_modules(
    service: &ModuleService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    if visible_course(&storage, &user, course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    let items = storage.list_modules(course_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ModuleListResponse { items },
        "Module list retrieved successfully",
    )))
}

pub async fn create_module(
    service: &ModuleService,
    course_id: i64,
    body: CreateModuleRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_course_by_id(course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    let module = storage.create_module(course_id, body).await?;
    info!("Module {} created in course {}", module.id, course_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Module, module.id)
            .details(serde_json::json!({ "course_id": course_id, "title": module.title })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        module,
        "Module created successfully",
    )))
}

/// 重排模块，ID 列表必须完整覆盖课程模块
pub async fn reorder_modules(
    service: &ModuleService,
    course_id: i64,
    body: ReorderModulesRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if storage.get_course_by_id(course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    let items = storage.reorder_modules(course_id, &body.module_ids).await?;
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Course, course_id)
            .details(serde_json::json!({ "module_order": body.module_ids })),
    )
    .await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ModuleListResponse { items },
        "Modules reordered successfully",
    )))
}

pub async fn get_module(
    service: &ModuleService,
    module_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let Some(module) = storage.get_module_by_id(module_id).await? else {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    };
    if visible_course(&storage, &user, module.course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let documents = storage.list_documents(module_id).await?;
    let videos = storage.list_videos(module_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ModuleDetailResponse {
            module,
            documents,
            videos,
        },
        "Module retrieved successfully",
    )))
}

pub async fn update_module(
    service: &ModuleService,
    module_id: i64,
    body: UpdateModuleRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    let Some(module) = storage.update_module(module_id, body).await? else {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    };
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Module, module.id)
            .details(serde_json::json!({ "title": module.title })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        module,
        "Module updated successfully",
    )))
}

pub async fn delete_module(
    service: &ModuleService,
    module_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(module) = storage.get_module_by_id(module_id).await? else {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    };

    // 作答记录随测验级联删除，有作答时拒绝
    if storage.count_module_quiz_attempts(module_id).await? > 0 {
        return Ok(bad_request(
            ErrorCode::ModuleHasAttempts,
            "Cannot delete module whose quizzes have attempts",
        ));
    }

    let documents = storage.list_documents(module_id).await?;
    storage.delete_module(module_id).await?;
    for document in &documents {
        remove_stored_file(&document.file_path).await;
    }
    info!("Module {} deleted from course {}", module_id, module.course_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Module, module_id).details(
            serde_json::json!({ "course_id": module.course_id, "title": module.title }),
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Module deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::enrollments::entities::EnrollmentStatus;
    use crate::models::modules::entities::ContentType;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_reorder_requires_every_module() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let course = seed_course(&raw, author.id, "Networking").await;
        let first = seed_module(&raw, course.id, "TCP").await;
        let second = seed_module(&raw, course.id, "UDP").await;
        let service = ModuleService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let result = service
            .reorder_modules(
                course.id,
                ReorderModulesRequest {
                    module_ids: vec![first.id],
                },
                &req,
            )
            .await;
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => e.error_response(),
        };
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = service
            .reorder_modules(
                course.id,
                ReorderModulesRequest {
                    module_ids: vec![second.id, first.id],
                },
                &req,
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["items"][0]["id"], second.id);
        assert_eq!(body["data"]["items"][0]["order_index"], 1);
    }

    #[actix_web::test]
    async fn test_modules_of_draft_hidden_from_employees() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Draft").await;
        let module = seed_module(&raw, course.id, "Intro").await;
        let service = ModuleService::with_storage(storage.clone());
        let req = request_as(&employee, &storage);

        let resp = service.list_modules(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();
        let resp = service.get_module(module.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["module"]["title"], "Intro");
    }

    #[actix_web::test]
    async fn test_module_changes_recompute_progress_and_guard_attempts() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let learner = seed_user(&raw, "learner", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Security").await;
        let first = seed_module(&raw, course.id, "Phishing").await;
        raw.create_enrollment_impl(learner.id, course.id, None, Some(author.id))
            .await
            .unwrap();
        raw.mark_module_complete_impl(learner.id, first.id)
            .await
            .unwrap();
        raw.recompute_enrollment_progress_impl(learner.id, course.id)
            .await
            .unwrap();
        let service = ModuleService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let resp = service
            .create_module(
                course.id,
                CreateModuleRequest {
                    title: "Passwords".into(),
                    description: None,
                    content_type: ContentType::Document,
                    content_url: None,
                    content_data: None,
                    order_index: 0,
                    is_mandatory: true,
                    estimated_duration: None,
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let second_id = body_json(resp).await["data"]["id"].as_i64().unwrap();

        let enrollment = raw
            .get_enrollment_impl(learner.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 50.0);
        assert_eq!(enrollment.status, EnrollmentStatus::InProgress);
        assert!(enrollment.completed_at.is_none());

        let quiz = raw
            .create_quiz_impl(
                first.id,
                serde_json::from_value(serde_json::json!({ "title": "Spot it" })).unwrap(),
            )
            .await
            .unwrap();
        raw.create_attempt_impl(quiz.id, learner.id, 1, 0.0)
            .await
            .unwrap();

        let resp = service.delete_module(first.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(raw.get_module_by_id_impl(first.id).await.unwrap().is_some());

        let resp = service.delete_module(second_id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let enrollment = raw
            .get_enrollment_impl(learner.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 100.0);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    }
}
