use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::RoleService;

static ROLE_SERVICE: Lazy<RoleService> = Lazy::new(RoleService::new_lazy);

pub async fn list_roles(req: HttpRequest) -> ActixResult<HttpResponse> {
    ROLE_SERVICE.list_roles(&req).await
}

pub fn configure_role_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/roles")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_roles)),
    );
}
