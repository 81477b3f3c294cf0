use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::declare_service;
use crate::models::{
    ApiResponse, ErrorCode,
    departments::{
        requests::{CreateDepartmentRequest, UpdateDepartmentRequest},
        responses::DepartmentListResponse,
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{flush_user_cache, not_found, validation_failed};

declare_service!(DepartmentService);

fn name_taken() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::DepartmentAlreadyExists,
        "Department name already exists",
    ))
}

impl DepartmentService {
    pub async fn list_departments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let items = storage.list_departments().await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            DepartmentListResponse { items },
            "Department list retrieved successfully",
        )))
    }

    pub async fn create_department(
        &self,
        body: CreateDepartmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = body.validate() {
            return Ok(validation_failed(msg));
        }

        let storage = self.get_storage(request)?;
        if storage
            .get_department_by_name(body.name.trim())
            .await?
            .is_some()
        {
            return Ok(name_taken());
        }

        let department = storage.create_department(body).await?;
        info!("Department {} created", department.name);
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Create, AuditEntity::Department, department.id)
                .details(serde_json::json!({ "name": department.name })),
        )
        .await;

        Ok(HttpResponse::Created().json(ApiResponse::success(
            department,
            "Department created successfully",
        )))
    }

    pub async fn update_department(
        &self,
        department_id: i64,
        body: UpdateDepartmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = body.validate() {
            return Ok(validation_failed(msg));
        }

        let storage = self.get_storage(request)?;
        if let Some(ref name) = body.name
            && let Some(existing) = storage.get_department_by_name(name.trim()).await?
            && existing.id != department_id
        {
            return Ok(name_taken());
        }

        let Some(department) = storage.update_department(department_id, body).await? else {
            return Ok(not_found(
                ErrorCode::DepartmentNotFound,
                "Department not found",
            ));
        };
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Update, AuditEntity::Department, department.id)
                .details(serde_json::json!({ "name": department.name })),
        )
        .await;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            department,
            "Department updated successfully",
        )))
    }

    /// 删除部门，成员变为无部门
    pub async fn delete_department(
        &self,
        department_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        if !storage.delete_department(department_id).await? {
            return Ok(not_found(
                ErrorCode::DepartmentNotFound,
                "Department not found",
            ));
        }

        flush_user_cache(request).await;
        info!("Department {} deleted", department_id);
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Delete, AuditEntity::Department, department_id),
        )
        .await;
        Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
            "Department deleted successfully",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::seed_user;
    use actix_web::http::StatusCode;

    fn create(name: &str) -> CreateDepartmentRequest {
        CreateDepartmentRequest {
            name: name.into(),
            description: None,
        }
    }

    #[actix_web::test]
    async fn test_duplicate_name_conflicts() {
        let (raw, storage) = memory_storage().await;
        let hr = seed_user(&raw, "hr", UserRole::Hr).await;
        let service = DepartmentService::with_storage(storage.clone());
        let req = request_as(&hr, &storage);

        let resp = service.create_department(create("Sales"), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = service.create_department(create(" Sales "), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let other = raw.create_department_impl(create("Ops")).await.unwrap();
        let resp = service
            .update_department(
                other.id,
                UpdateDepartmentRequest {
                    name: Some("Sales".into()),
                    description: None,
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_delete_missing_department() {
        let (raw, storage) = memory_storage().await;
        let hr = seed_user(&raw, "hr", UserRole::Hr).await;
        let service = DepartmentService::with_storage(storage.clone());
        let req = request_as(&hr, &storage);

        let resp = service.delete_department(404, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
