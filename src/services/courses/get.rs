use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::responses::CourseDetailResponse,
    enrollments::entities::EnrollmentStatus,
    rbac::entities::Permission,
};
use crate::services::not_found;

pub async fn get_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let course = match storage.get_course_by_id(course_id).await? {
        Some(course)
            if course.is_published() || user.has_permission(Permission::CoursesManage) =>
        {
            course
        }
        _ => return Ok(not_found(ErrorCode::CourseNotFound, "Course not found")),
    };

    let category_name = match course.category_id {
        Some(id) => storage.get_category_by_id(id).await?.map(|c| c.name),
        None => None,
    };
    let module_count = storage.count_modules(course_id).await? as i64;
    let enrollment_count = storage.count_course_enrollments(course_id).await? as i64;
    let is_enrolled = storage
        .get_enrollment(user.id, course_id)
        .await?
        .is_some_and(|e| e.status != EnrollmentStatus::Dropped);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CourseDetailResponse {
            course,
            category_name,
            module_count,
            enrollment_count,
            is_enrolled,
        },
        "Course retrieved successfully",
    )))
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
    async fn test_draft_hidden_from_employees() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Draft").await;
        let service = CourseService::with_storage(storage.clone());

        let resp = service
            .get_course(course.id, &request_as(&employee, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = service
            .get_course(course.id, &request_as(&author, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_detail_counts() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Security").await;
        seed_module(&raw, course.id, "Intro").await;
        seed_module(&raw, course.id, "Phishing").await;
        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();
        raw.create_enrollment_impl(employee.id, course.id, None, None)
            .await
            .unwrap();

        let service = CourseService::with_storage(storage.clone());
        let resp = service
            .get_course(course.id, &request_as(&employee, &storage))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["module_count"], 2);
        assert_eq!(body["data"]["enrollment_count"], 1);
        assert_eq!(body["data"]["is_enrolled"], true);
    }
}
