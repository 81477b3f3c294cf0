use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::audit::requests::{AuditLogQuery, AuditSummaryQuery};
use crate::models::rbac::entities::Permission;
use crate::services::AuditService;
use crate::utils::SafeIDI64;

static AUDIT_SERVICE: Lazy<AuditService> = Lazy::new(AuditService::new_lazy);

pub async fn list_logs(
    req: HttpRequest,
    query: web::Query<AuditLogQuery>,
) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.list_logs(query.into_inner(), &req).await
}

pub async fn get_summary(
    req: HttpRequest,
    query: web::Query<AuditSummaryQuery>,
) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.get_summary(query.into_inner(), &req).await
}

pub async fn get_log(req: HttpRequest, log_id: SafeIDI64) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.get_log(log_id.0, &req).await
}

pub fn configure_audit_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/audit")
            .wrap(RequirePermission::new(Permission::ReportsView))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_logs))
            .route("/summary", web::get().to(get_summary))
            .route("/{id}", web::get().to(get_log)),
    );
}
