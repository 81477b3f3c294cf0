//! 审计日志
//!
//! 写入由各业务服务在状态变更成功后调用 [`record_audit`]，
//! 写入失败只记录警告，不影响业务响应。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use crate::declare_service;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::{
        entities::NewAuditLog,
        requests::{AuditLogQuery, AuditSummaryQuery},
    },
};
pub(crate) use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::services::{not_found, validation_failed};
use crate::storage::Storage;

declare_service!(AuditService);

/// 一次待记录的操作
pub(crate) struct AuditEvent {
    action: AuditAction,
    entity: AuditEntity,
    entity_id: Option<i64>,
    actor: Option<i64>,
    details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        entity: AuditEntity,
        entity_id: impl Into<Option<i64>>,
    ) -> Self {
        Self {
            action,
            entity,
            entity_id: entity_id.into(),
            actor: None,
            details: serde_json::json!({}),
        }
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// 请求上尚未附带用户时（如登录）显式指定操作者
    pub fn by(mut self, user_id: i64) -> Self {
        self.actor = Some(user_id);
        self
    }
}

/// 记录审计日志，操作者默认取当前登录用户
pub(crate) async fn record_audit(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    event: AuditEvent,
) {
    let user_id = event
        .actor
        .or_else(|| RequireJWT::extract_user_id(request));
    let ip_address = request
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    let entry = NewAuditLog {
        user_id,
        action: event.action,
        entity_type: event.entity,
        entity_id: event.entity_id,
        details: event.details,
        ip_address,
    };
    if let Err(e) = storage.record_audit(entry).await {
        warn!(
            "Failed to record audit log {} {}: {}",
            event.action, event.entity, e
        );
    }
}

impl AuditService {
    pub async fn list_logs(
        &self,
        query: AuditLogQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = query.validate() {
            return Ok(validation_failed(msg));
        }

        let storage = self.get_storage(request)?;
        let response = storage.list_audit_logs(query).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Audit logs retrieved successfully",
        )))
    }

    pub async fn get_summary(
        &self,
        query: AuditSummaryQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = query.validate() {
            return Ok(validation_failed(msg));
        }

        let storage = self.get_storage(request)?;
        let summary = storage.audit_summary(query).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            summary,
            "Audit summary retrieved successfully",
        )))
    }

    pub async fn get_log(&self, log_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_audit_log(log_id).await? {
            Some(log) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                log,
                "Audit log retrieved successfully",
            ))),
            None => Ok(not_found(ErrorCode::AuditLogNotFound, "Audit log not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::seed_user;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_recorded_event_is_listed_with_actor() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let req = request_as(&admin, &storage);

        record_audit(
            &storage,
            &req,
            AuditEvent::new(AuditAction::Delete, AuditEntity::Department, 7)
                .details(serde_json::json!({ "name": "Legal" })),
        )
        .await;

        let service = AuditService::with_storage(storage.clone());
        let resp = service
            .list_logs(AuditLogQuery::default(), &req)
            .await
            .unwrap();
        let body = body_json(resp).await;
        let item = &body["data"]["items"][0];
        assert_eq!(item["action"], "DELETE");
        assert_eq!(item["entity_type"], "department");
        assert_eq!(item["entity_id"], 7);
        assert_eq!(item["user_id"], admin.id);
        assert_eq!(item["details"]["name"], "Legal");

        let id = item["id"].as_i64().unwrap();
        let resp = service.get_log(id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = service.get_log(id + 100, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = service
            .get_summary(AuditSummaryQuery::default(), &req)
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["data"]["total_count"], 1);
    }

    #[actix_web::test]
    async fn test_inverted_range_rejected() {
        let (raw, storage) = memory_storage().await;
        let admin = seed_user(&raw, "admin", UserRole::Admin).await;
        let service = AuditService::with_storage(storage.clone());

        let resp = service
            .get_summary(
                AuditSummaryQuery {
                    start_date: Some(chrono::Utc::now()),
                    end_date: Some(chrono::Utc::now() - chrono::Duration::days(1)),
                },
                &request_as(&admin, &storage),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
