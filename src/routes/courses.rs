use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::PaginationQuery;
use crate::models::courses::requests::{
    BulkEnrollRequest, CourseListParams, CreateCourseRequest, UpdateCourseRequest,
};
use crate::models::rbac::entities::Permission;
use crate::services::CourseService;
use crate::utils::SafeIDI64;

static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseListParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(query.into_inner(), &req).await
}

pub async fn get_course_stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course_stats(&req).await
}

pub async fn create_course(
    req: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(body.into_inner(), &req).await
}

pub async fn get_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(course_id.0, &req).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeIDI64,
    body: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(course_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(course_id.0, &req).await
}

pub async fn publish_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.publish_course(course_id.0, &req).await
}

pub async fn archive_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.archive_course(course_id.0, &req).await
}

pub async fn enroll(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.enroll(course_id.0, &req).await
}

pub async fn bulk_enroll(
    req: HttpRequest,
    course_id: SafeIDI64,
    body: web::Json<BulkEnrollRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .bulk_enroll(course_id.0, body.into_inner(), &req)
        .await
}

pub async fn list_enrollments(
    req: HttpRequest,
    course_id: SafeIDI64,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .list_enrollments(course_id.0, query.into_inner(), &req)
        .await
}

pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequirePermission::new(Permission::CoursesManage);
    let publish = || RequirePermission::new(Permission::CoursesPublish);
    let enrollments = || RequirePermission::new(Permission::EnrollmentsManage);

    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .route(
                "/stats",
                web::get()
                    .to(get_course_stats)
                    .wrap(RequirePermission::new(Permission::ReportsView)),
            )
            .route("", web::get().to(list_courses))
            .route("", web::post().to(create_course).wrap(manage()))
            .route("/{id}", web::get().to(get_course))
            .route("/{id}", web::put().to(update_course).wrap(manage()))
            .route("/{id}", web::delete().to(delete_course).wrap(manage()))
            .route("/{id}/publish", web::post().to(publish_course).wrap(publish()))
            .route("/{id}/archive", web::post().to(archive_course).wrap(publish()))
            .route("/{id}/enroll", web::post().to(enroll))
            .route(
                "/{id}/enrollments",
                web::post().to(bulk_enroll).wrap(enrollments()),
            )
            .route(
                "/{id}/enrollments",
                web::get().to(list_enrollments).wrap(enrollments()),
            ),
    );
}
