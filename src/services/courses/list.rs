use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse,
    courses::{
        entities::CourseStatus,
        requests::{CourseListParams, CourseListQuery},
    },
    rbac::entities::Permission,
};

pub async fn list_courses(
    service: &CourseService,
    query: CourseListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let mut query = CourseListQuery::from(query);
    // 无管理权限只能看到已发布课程
    if !user.has_permission(Permission::CoursesManage) {
        query.status = Some(CourseStatus::Published);
    }

    let response = storage.list_courses_with_pagination(query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Course list retrieved successfully",
    )))
}

pub async fn get_course_stats(
    service: &CourseService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let stats = storage.get_course_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        stats,
        "Course statistics retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_user};

    #[actix_web::test]
    async fn test_employees_only_see_published_courses() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let published = seed_course(&raw, author.id, "Published").await;
        seed_course(&raw, author.id, "Draft").await;
        raw.set_course_status_impl(published.id, CourseStatus::Published)
            .await
            .unwrap();

        let service = CourseService::with_storage(storage.clone());

        let resp = service
            .list_courses(CourseListParams::default(), &request_as(&employee, &storage))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["items"][0]["title"], "Published");

        let resp = service
            .list_courses(CourseListParams::default(), &request_as(&author, &storage))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    }
}
