use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CourseService, check_references};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::requests::{CreateCourseRequest, UpdateCourseRequest},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, not_found, validation_failed};

pub async fn create_course(
    service: &CourseService,
    body: CreateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let creator_id = RequireJWT::current_user(request)?.id;
    let storage = service.get_storage(request)?;

    if let Some(resp) =
        check_references(&storage, None, body.category_id, Some(&body.prerequisites)).await?
    {
        return Ok(resp);
    }

    let course = storage.create_course(body, creator_id).await?;
    info!("Course {} created by user {}", course.id, creator_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Course, course.id)
            .details(serde_json::json!({ "title": course.title })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        course,
        "Course created successfully",
    )))
}

pub async fn update_course(
    service: &CourseService,
    course_id: i64,
    body: UpdateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_course_by_id(course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    if let Some(resp) = check_references(
        &storage,
        Some(course_id),
        body.category_id,
        body.prerequisites.as_deref(),
    )
    .await?
    {
        return Ok(resp);
    }

    let Some(course) = storage.update_course(course_id, body).await? else {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    };
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Course, course.id)
            .details(serde_json::json!({ "title": course.title })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        course,
        "Course updated successfully",
    )))
}

/// 有选课记录的课程不能删除
pub async fn delete_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let Some(course) = storage.get_course_by_id(course_id).await? else {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    };
    if storage.count_course_enrollments(course_id).await? > 0 {
        return Ok(bad_request(
            ErrorCode::CourseHasEnrollments,
            "Cannot delete course with existing enrollments",
        ));
    }

    storage.soft_delete_course(course_id).await?;
    info!("Course {} deleted", course_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Course, course_id)
            .details(serde_json::json!({ "title": course.title })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Course deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{course_request, seed_course, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_create_course_sets_creator_and_draft() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let service = CourseService::with_storage(storage.clone());

        let resp = service
            .create_course(course_request("Onboarding"), &request_as(&author, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["creator_id"], author.id);
    }

    #[actix_web::test]
    async fn test_invalid_references_rejected() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let service = CourseService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let mut body = course_request("Advanced");
        body.category_id = Some(404);
        let resp = service.create_course(body, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let mut body = course_request("Advanced");
        body.prerequisites = vec![404];
        let resp = service.create_course(body, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let basics = seed_course(&raw, author.id, "Basics").await;
        let resp = service
            .update_course(
                basics.id,
                UpdateCourseRequest {
                    prerequisites: Some(vec![basics.id]),
                    ..Default::default()
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_refused_with_enrollments() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Compliance").await;
        raw.create_enrollment_impl(employee.id, course.id, None, None)
            .await
            .unwrap();

        let service = CourseService::with_storage(storage.clone());
        let resp = service
            .delete_course(course.id, &request_as(&author, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_course_changes_are_audited() {
        use crate::models::audit::requests::AuditLogQuery;

        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let service = CourseService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let resp = service
            .create_course(course_request("Privacy"), &req)
            .await
            .unwrap();
        let course_id = body_json(resp).await["data"]["id"].as_i64().unwrap();
        // 校验失败不产生审计记录
        let mut invalid = course_request("Privacy");
        invalid.category_id = Some(404);
        service.create_course(invalid, &req).await.unwrap();
        service.delete_course(course_id, &req).await.unwrap();

        let logs = raw
            .list_audit_logs_impl(AuditLogQuery {
                entity_type: Some("course".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.pagination.total, 2);
        assert_eq!(logs.items[0].action, AuditAction::Delete);
        assert_eq!(logs.items[1].action, AuditAction::Create);
        assert_eq!(logs.items[1].entity_id, Some(course_id));
        assert_eq!(logs.items[1].user_id, Some(author.id));
        assert_eq!(logs.items[1].details["title"], "Privacy");
    }
}
