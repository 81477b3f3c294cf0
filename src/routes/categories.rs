use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::categories::requests::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::models::rbac::entities::Permission;
use crate::services::CategoryService;
use crate::utils::SafeIDI64;

static CATEGORY_SERVICE: Lazy<CategoryService> = Lazy::new(CategoryService::new_lazy);

pub async fn list_categories(req: HttpRequest) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.list_categories(&req).await
}

pub async fn get_category(req: HttpRequest, category_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.get_category(category_id.0, &req).await
}

pub async fn create_category(
    req: HttpRequest,
    body: web::Json<CreateCategoryRequest>,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.create_category(body.into_inner(), &req).await
}

pub async fn update_category(
    req: HttpRequest,
    category_id: SafeIDI64,
    body: web::Json<UpdateCategoryRequest>,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE
        .update_category(category_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_category(
    req: HttpRequest,
    category_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.delete_category(category_id.0, &req).await
}

pub fn configure_category_routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequirePermission::new(Permission::CategoriesManage);

    cfg.service(
        web::scope("/api/v1/categories")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category).wrap(manage()))
            .route("/{id}", web::get().to(get_category))
            .route("/{id}", web::put().to(update_category).wrap(manage()))
            .route("/{id}", web::delete().to(delete_category).wrap(manage())),
    );
}
