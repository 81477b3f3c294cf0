use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::models::{ApiResponse, ErrorCode, courses::entities::CourseStatus};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, not_found};

/// 发布课程：至少需要一个模块
pub async fn publish_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let Some(course) = storage.get_course_by_id(course_id).await? else {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    };
    if course.is_published() {
        return Ok(bad_request(
            ErrorCode::CourseAlreadyPublished,
            "Course is already published",
        ));
    }
    if storage.count_modules(course_id).await? == 0 {
        return Ok(bad_request(
            ErrorCode::CourseHasNoModules,
            "Cannot publish course without modules",
        ));
    }

    match storage
        .set_course_status(course_id, CourseStatus::Published)
        .await?
    {
        Some(course) => {
            info!("Course {} published", course_id);
            record_audit(
                &storage,
                request,
                AuditEvent::new(AuditAction::Update, AuditEntity::Course, course_id)
                    .details(serde_json::json!({ "status": course.status })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                course,
                "Course published successfully",
            )))
        }
        None => Ok(not_found(ErrorCode::CourseNotFound, "Course not found")),
    }
}

pub async fn archive_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage
        .set_course_status(course_id, CourseStatus::Archived)
        .await?
    {
        Some(course) => {
            info!("Course {} archived", course_id);
            record_audit(
                &storage,
                request,
                AuditEvent::new(AuditAction::Update, AuditEntity::Course, course_id)
                    .details(serde_json::json!({ "status": course.status })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                course,
                "Course archived successfully",
            )))
        }
        None => Ok(not_found(ErrorCode::CourseNotFound, "Course not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_publish_requires_modules_once() {
        let (raw, storage) = memory_storage().await;
        let hr = seed_user(&raw, "hr", UserRole::Hr).await;
        let course = seed_course(&raw, hr.id, "Ethics").await;
        let service = CourseService::with_storage(storage.clone());
        let req = request_as(&hr, &storage);

        let resp = service.publish_course(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        seed_module(&raw, course.id, "Code of conduct").await;
        let resp = service.publish_course(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["status"], "published");
        assert!(!body["data"]["published_at"].is_null());

        let resp = service.publish_course(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = service.archive_course(course.id, &req).await.unwrap();
        assert_eq!(body_json(resp).await["data"]["status"], "archived");
    }
}
