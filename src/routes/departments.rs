use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::departments::requests::{CreateDepartmentRequest, UpdateDepartmentRequest};
use crate::models::rbac::entities::Permission;
use crate::services::DepartmentService;
use crate::utils::SafeIDI64;

static DEPARTMENT_SERVICE: Lazy<DepartmentService> = Lazy::new(DepartmentService::new_lazy);

pub async fn list_departments(req: HttpRequest) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE.list_departments(&req).await
}

pub async fn create_department(
    req: HttpRequest,
    body: web::Json<CreateDepartmentRequest>,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .create_department(body.into_inner(), &req)
        .await
}

pub async fn update_department(
    req: HttpRequest,
    department_id: SafeIDI64,
    body: web::Json<UpdateDepartmentRequest>,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .update_department(department_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_department(
    req: HttpRequest,
    department_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .delete_department(department_id.0, &req)
        .await
}

pub fn configure_department_routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequirePermission::new(Permission::DepartmentsManage);

    cfg.service(
        web::scope("/api/v1/departments")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_departments))
            .route("", web::post().to(create_department).wrap(manage()))
            .route("/{id}", web::put().to(update_department).wrap(manage()))
            .route("/{id}", web::delete().to(delete_department).wrap(manage())),
    );
}
