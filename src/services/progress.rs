use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::declare_service;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    enrollments::{
        entities::EnrollmentStatus,
        responses::{
            CourseProgressDetailResponse, CourseProgressListResponse, CourseProgressSummary,
            ModuleProgressItem,
        },
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::modules::visible_course;
use crate::services::{bad_request, not_found};

declare_service!(ProgressService);

impl ProgressService {
    /// 当前用户的全部选课及进度
    pub async fn list_my_courses(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let user = RequireJWT::current_user(request)?;
        let storage = self.get_storage(request)?;

        let now = chrono::Utc::now();
        let items = storage
            .list_user_enrollments(user.id)
            .await?
            .into_iter()
            .map(|(enrollment, course_title)| CourseProgressSummary {
                is_overdue: enrollment.is_overdue_at(now),
                enrollment,
                course_title,
            })
            .collect();

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            CourseProgressListResponse { items },
            "Course progress retrieved successfully",
        )))
    }

    /// 单门课程的逐模块完成情况
    pub async fn get_course_progress(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = RequireJWT::current_user(request)?;
        let storage = self.get_storage(request)?;

        let Some(enrollment) = storage.get_enrollment(user.id, course_id).await? else {
            return Ok(not_found(ErrorCode::EnrollmentNotFound, "Enrollment not found"));
        };
        let Some(course) = storage.get_course_by_id(course_id).await? else {
            return Ok(not_found(ErrorCode::CourseNotFound, "Course not found"));
        };

        let completed = storage.list_module_progress(user.id, course_id).await?;
        let modules: Vec<ModuleProgressItem> = storage
            .list_modules(course_id)
            .await?
            .into_iter()
            .map(|module| {
                let done = completed.iter().find(|p| p.module_id == module.id);
                ModuleProgressItem {
                    module_id: module.id,
                    title: module.title,
                    order_index: module.order_index,
                    is_mandatory: module.is_mandatory,
                    completed: done.is_some(),
                    completed_at: done.map(|p| p.completed_at),
                }
            })
            .collect();

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            CourseProgressDetailResponse {
                is_overdue: enrollment.is_overdue(),
                enrollment,
                course_title: course.title,
                total_modules: modules.len() as i64,
                completed_modules: modules.iter().filter(|m| m.completed).count() as i64,
                modules,
            },
            "Course progress retrieved successfully",
        )))
    }

    /// 标记模块完成，重复调用不改变结果
    pub async fn complete_module(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = RequireJWT::current_user(request)?;
        let storage = self.get_storage(request)?;

        let Some(module) = storage.get_module_by_id(module_id).await? else {
            return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
        };
        // 草稿或已归档课程对学员不可见
        if visible_course(&storage, &user, module.course_id)
            .await?
            .is_none()
        {
            return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
        }

        let enrolled = storage
            .get_enrollment(user.id, module.course_id)
            .await?
            .is_some_and(|e| e.status != EnrollmentStatus::Dropped);
        if !enrolled {
            return Ok(bad_request(
                ErrorCode::NotEnrolled,
                "You are not enrolled in this course",
            ));
        }

        if storage.mark_module_complete(user.id, module_id).await? {
            info!("User {} completed module {}", user.id, module_id);
        }

        match storage
            .recompute_enrollment_progress(user.id, module.course_id)
            .await?
        {
            Some(enrollment) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                enrollment,
                "Module marked as complete",
            ))),
            None => Ok(not_found(ErrorCode::EnrollmentNotFound, "Enrollment not found")),
        }
    }

    /// 退课
    pub async fn drop_course(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = RequireJWT::current_user(request)?;
        let storage = self.get_storage(request)?;

        match storage.drop_enrollment(user.id, course_id).await? {
            Some(enrollment) => {
                info!("User {} dropped course {}", user.id, course_id);
                record_audit(
                    &storage,
                    request,
                    AuditEvent::new(AuditAction::Update, AuditEntity::Enrollment, enrollment.id)
                        .details(serde_json::json!({
                            "course_id": course_id,
                            "status": enrollment.status,
                        })),
                )
                .await;
                Ok(HttpResponse::Ok().json(ApiResponse::success(
                    enrollment,
                    "Course dropped successfully",
                )))
            }
            None => Ok(not_found(ErrorCode::EnrollmentNotFound, "Enrollment not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_complete_modules_until_course_done() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let learner = seed_user(&raw, "learner", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Onboarding").await;
        let first = seed_module(&raw, course.id, "Welcome").await;
        let second = seed_module(&raw, course.id, "Tools").await;
        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();
        let service = ProgressService::with_storage(storage.clone());
        let req = request_as(&learner, &storage);

        let resp = service.complete_module(first.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        raw.create_enrollment_impl(learner.id, course.id, None, None)
            .await
            .unwrap();

        let resp = service.complete_module(first.id, &req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["progress_percentage"], 50.0);
        assert_eq!(body["data"]["status"], "in_progress");

        // 重复标记不改变进度
        let resp = service.complete_module(first.id, &req).await.unwrap();
        assert_eq!(body_json(resp).await["data"]["progress_percentage"], 50.0);

        let resp = service.complete_module(second.id, &req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["status"], "completed");
        assert!(!body["data"]["completed_at"].is_null());

        let resp = service.get_course_progress(course.id, &req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["total_modules"], 2);
        assert_eq!(body["data"]["completed_modules"], 2);
        assert_eq!(body["data"]["modules"][0]["completed"], true);
    }

    #[actix_web::test]
    async fn test_list_and_drop() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let learner = seed_user(&raw, "learner", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Ethics").await;
        raw.create_enrollment_impl(
            learner.id,
            course.id,
            Some(chrono::Utc::now().timestamp() - 3600),
            Some(author.id),
        )
        .await
        .unwrap();
        let service = ProgressService::with_storage(storage.clone());
        let req = request_as(&learner, &storage);

        let resp = service.list_my_courses(&req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["items"][0]["course_title"], "Ethics");
        assert_eq!(body["data"]["items"][0]["is_overdue"], true);

        let resp = service.drop_course(course.id, &req).await.unwrap();
        assert_eq!(body_json(resp).await["data"]["status"], "dropped");

        let resp = service.drop_course(999, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cannot_complete_module_of_draft_course() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let learner = seed_user(&raw, "learner", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Unreleased").await;
        let module = seed_module(&raw, course.id, "Intro").await;
        raw.create_enrollment_impl(learner.id, course.id, None, Some(author.id))
            .await
            .unwrap();
        let service = ProgressService::with_storage(storage.clone());

        let resp = service
            .complete_module(module.id, &request_as(&learner, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(
            raw.list_module_progress_impl(learner.id, course.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
