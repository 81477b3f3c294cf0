use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::CourseService;
use crate::errors::LmsError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, PaginationQuery,
    courses::{
        requests::BulkEnrollRequest,
        responses::{BulkEnrollFailure, BulkEnrollResponse},
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, not_found, validation_failed};

/// 当前用户选修已发布课程
pub async fn enroll_self(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user_id = RequireJWT::current_user(request)?.id;
    let storage = service.get_storage(request)?;

    let Some(course) = storage.get_course_by_id(course_id).await? else {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    };
    if !course.is_published() {
        return Ok(bad_request(
            ErrorCode::CourseNotPublished,
            "Course is not published",
        ));
    }

    match storage.create_enrollment(user_id, course_id, None, None).await {
        Ok(enrollment) => {
            info!("User {} enrolled in course {}", user_id, course_id);
            record_audit(
                &storage,
                request,
                AuditEvent::new(AuditAction::Create, AuditEntity::Enrollment, enrollment.id)
                    .details(serde_json::json!({ "course_id": course_id })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                enrollment,
                "Enrolled successfully",
            )))
        }
        Err(LmsError::BusinessRule(msg)) => Ok(bad_request(ErrorCode::AlreadyEnrolled, msg)),
        Err(e) => Err(e.into()),
    }
}

/// 批量选课，逐个用户记录失败原因
pub async fn bulk_enroll(
    service: &CourseService,
    course_id: i64,
    body: BulkEnrollRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let assigned_by = RequireJWT::current_user(request)?.id;
    let storage = service.get_storage(request)?;

    if storage.get_course_by_id(course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    let due_date = body.due_date.map(|d| d.timestamp());
    let mut success_count = 0;
    let mut failures = Vec::new();

    for user_id in body.user_ids {
        let reason = match storage.get_user_by_id(user_id).await? {
            Some(user) if user.is_active => {
                match storage
                    .create_enrollment(user_id, course_id, due_date, Some(assigned_by))
                    .await
                {
                    Ok(enrollment) => {
                        record_audit(
                            &storage,
                            request,
                            AuditEvent::new(
                                AuditAction::Create,
                                AuditEntity::Enrollment,
                                enrollment.id,
                            )
                            .details(serde_json::json!({
                                "course_id": course_id,
                                "user_id": user_id,
                                "due_date": body.due_date,
                            })),
                        )
                        .await;
                        None
                    }
                    Err(e) => Some(e.message().to_string()),
                }
            }
            Some(_) => Some("User is inactive".to_string()),
            None => Some("User not found".to_string()),
        };

        match reason {
            None => success_count += 1,
            Some(reason) => {
                warn!("Bulk enroll of user {} into course {} failed: {}", user_id, course_id, reason);
                failures.push(BulkEnrollFailure { user_id, reason });
            }
        }
    }

    info!(
        "Bulk enrolled {} users into course {} ({} failed)",
        success_count,
        course_id,
        failures.len()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        BulkEnrollResponse {
            success_count,
            failure_count: failures.len() as i64,
            failures,
        },
        "Bulk enrollment completed",
    )))
}

pub async fn list_enrollments(
    service: &CourseService,
    course_id: i64,
    query: PaginationQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if storage.get_course_by_id(course_id).await?.is_none() {
        return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
    }

    let response = storage.list_course_enrollments(course_id, query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Enrollment list retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_self_enroll_rules() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Onboarding").await;
        let service = CourseService::with_storage(storage.clone());
        let req = request_as(&employee, &storage);

        let resp = service.enroll(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();
        let resp = service.enroll(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = service.enroll(course.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::AlreadyEnrolled as i32);
    }

    #[actix_web::test]
    async fn test_bulk_enroll_reports_failures() {
        let (raw, storage) = memory_storage().await;
        let hr = seed_user(&raw, "hr", UserRole::Hr).await;
        let alice = seed_user(&raw, "alice", UserRole::Employee).await;
        let bob = seed_user(&raw, "bob", UserRole::Employee).await;
        let course = seed_course(&raw, hr.id, "Harassment prevention").await;
        raw.create_enrollment_impl(bob.id, course.id, None, None)
            .await
            .unwrap();

        let service = CourseService::with_storage(storage.clone());
        let resp = service
            .bulk_enroll(
                course.id,
                BulkEnrollRequest {
                    user_ids: vec![alice.id, bob.id, 9999],
                    due_date: Some(chrono::Utc::now() + chrono::Duration::days(30)),
                },
                &request_as(&hr, &storage),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["success_count"], 1);
        assert_eq!(body["data"]["failure_count"], 2);

        let enrollment = raw
            .get_enrollment_impl(alice.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.assigned_by, Some(hr.id));
        assert!(enrollment.due_date.is_some());
    }
}
