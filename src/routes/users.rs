use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::rbac::entities::Permission;
use crate::models::users::requests::{
    CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserListParams,
};
use crate::services::UserService;
use crate::utils::SafeIDI64;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

// HTTP处理程序
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    user_data: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(user_data.into_inner(), &req).await
}

pub async fn get_user_stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user_stats(&req).await
}

pub async fn get_profile(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_profile(&req).await
}

pub async fn update_profile(
    req: HttpRequest,
    update_data: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_profile(update_data.into_inner(), &req)
        .await
}

pub async fn get_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(user_id.0, &req).await
}

pub async fn update_user(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_user(user_id.0, &req).await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    let view = || RequirePermission::new(Permission::UsersView);
    let manage = || RequirePermission::new(Permission::UsersManage);

    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireJWT)
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/stats", web::get().to(get_user_stats).wrap(view()))
            .route("", web::get().to(list_users).wrap(view()))
            .route("", web::post().to(create_user).wrap(manage()))
            .route("/{id}", web::get().to(get_user).wrap(view()))
            .route("/{id}", web::put().to(update_user).wrap(manage()))
            .route("/{id}", web::delete().to(delete_user).wrap(manage())),
    );
}
