use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::ProgressService;
use crate::utils::{SafeCourseIdI64, SafeModuleIdI64};

static PROGRESS_SERVICE: Lazy<ProgressService> = Lazy::new(ProgressService::new_lazy);

pub async fn list_my_courses(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROGRESS_SERVICE.list_my_courses(&req).await
}

pub async fn get_course_progress(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    PROGRESS_SERVICE.get_course_progress(course_id.0, &req).await
}

pub async fn drop_course(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    PROGRESS_SERVICE.drop_course(course_id.0, &req).await
}

pub async fn complete_module(
    req: HttpRequest,
    module_id: SafeModuleIdI64,
) -> ActixResult<HttpResponse> {
    PROGRESS_SERVICE.complete_module(module_id.0, &req).await
}

pub fn configure_progress_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/progress")
            .wrap(middlewares::RequireJWT)
            .route("/courses", web::get().to(list_my_courses))
            .route("/courses/{course_id}", web::get().to(get_course_progress))
            .route("/courses/{course_id}", web::delete().to(drop_course))
            .route(
                "/modules/{module_id}/complete",
                web::post().to(complete_module),
            ),
    );
}
