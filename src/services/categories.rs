use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::declare_service;
use crate::errors::Result;
use crate::models::{
    ApiResponse, ErrorCode,
    categories::{
        requests::{CreateCategoryRequest, UpdateCategoryRequest},
        responses::CategoryListResponse,
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{bad_request, not_found, validation_failed};
use crate::storage::Storage;

declare_service!(CategoryService);

fn name_taken() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::CategoryAlreadyExists,
        "Category name already exists",
    ))
}

/// 同名分类已存在（排除自身）
async fn name_in_use(storage: &Arc<dyn Storage>, name: &str, except: Option<i64>) -> Result<bool> {
    Ok(storage
        .get_category_by_name(name.trim())
        .await?
        .is_some_and(|c| Some(c.id) != except))
}

impl CategoryService {
    pub async fn list_categories(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let items = storage.list_categories().await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            CategoryListResponse { items },
            "Category list retrieved successfully",
        )))
    }

    pub async fn get_category(
        &self,
        category_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_category_by_id(category_id).await? {
            Some(category) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                category,
                "Category retrieved successfully",
            ))),
            None => Ok(not_found(ErrorCode::CategoryNotFound, "Category not found")),
        }
    }

    pub async fn create_category(
        &self,
        body: CreateCategoryRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = body.validate() {
            return Ok(validation_failed(msg));
        }

        let storage = self.get_storage(request)?;
        if name_in_use(&storage, &body.name, None).await? {
            return Ok(name_taken());
        }

        if let Some(parent_id) = body.parent_id
            && storage.get_category_by_id(parent_id).await?.is_none()
        {
            return Ok(bad_request(
                ErrorCode::CategoryNotFound,
                "Parent category not found",
            ));
        }

        let category = storage.create_category(body).await?;
        info!("Category {} created", category.name);
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Create, AuditEntity::Category, category.id)
                .details(serde_json::json!({ "name": category.name })),
        )
        .await;

        Ok(HttpResponse::Created().json(ApiResponse::success(
            category,
            "Category created successfully",
        )))
    }

    pub async fn update_category(
        &self,
        category_id: i64,
        body: UpdateCategoryRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(msg) = body.validate() {
            return Ok(validation_failed(msg));
        }
        if body.parent_id == Some(category_id) {
            return Ok(validation_failed("Category cannot be its own parent"));
        }

        let storage = self.get_storage(request)?;
        if storage.get_category_by_id(category_id).await?.is_none() {
            return Ok(not_found(ErrorCode::CategoryNotFound, "Category not found"));
        }

        if let Some(ref name) = body.name
            && name_in_use(&storage, name, Some(category_id)).await?
        {
            return Ok(name_taken());
        }

        if let Some(parent_id) = body.parent_id
            && storage.get_category_by_id(parent_id).await?.is_none()
        {
            return Ok(bad_request(
                ErrorCode::CategoryNotFound,
                "Parent category not found",
            ));
        }

        let Some(category) = storage.update_category(category_id, body).await? else {
            return Ok(not_found(ErrorCode::CategoryNotFound, "Category not found"));
        };
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Update, AuditEntity::Category, category.id)
                .details(serde_json::json!({ "name": category.name })),
        )
        .await;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            category,
            "Category updated successfully",
        )))
    }

    /// 仍有课程引用时拒绝删除
    pub async fn delete_category(
        &self,
        category_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;

        if storage.count_courses_in_category(category_id).await? > 0 {
            return Ok(bad_request(
                ErrorCode::CategoryInUse,
                "Cannot delete category with existing courses",
            ));
        }

        if !storage.delete_category(category_id).await? {
            return Ok(not_found(ErrorCode::CategoryNotFound, "Category not found"));
        }

        info!("Category {} deleted", category_id);
        record_audit(
            &storage,
            request,
            AuditEvent::new(AuditAction::Delete, AuditEntity::Category, category_id),
        )
        .await;
        Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
            "Category deleted successfully",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{course_request, seed_user};
    use actix_web::http::StatusCode;

    fn create(name: &str, parent_id: Option<i64>) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.into(),
            description: None,
            parent_id,
            color_code: None,
        }
    }

    #[actix_web::test]
    async fn test_parent_must_exist_and_differ() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let service = CategoryService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let resp = service
            .create_category(create("Child", Some(77)), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let root = raw.create_category_impl(create("Root", None)).await.unwrap();
        let resp = service
            .update_category(
                root.id,
                UpdateCategoryRequest {
                    name: None,
                    description: None,
                    parent_id: Some(root.id),
                    color_code: None,
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_category_in_use_cannot_be_deleted() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let service = CategoryService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let category = raw.create_category_impl(create("Safety", None)).await.unwrap();
        let mut course = course_request("Fire drill");
        course.category_id = Some(category.id);
        raw.create_course_impl(course, author.id).await.unwrap();

        let resp = service.delete_category(category.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = service
            .create_category(create("safety", None), &req)
            .await
            .unwrap();
        // 名称大小写不同视为不同分类
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
