use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::path::Path;
use tracing::{error, info, warn};

use super::{ModuleService, visible_course};
use crate::config::AppConfig;
use crate::errors::LmsError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    modules::{requests::CreateDocumentRequest, responses::DocumentListResponse},
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::{not_found, validation_failed};
use crate::utils::{content_type_for, extension_of};

pub async fn list_documents(
    service: &ModuleService,
    module_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let visible = match storage.get_module_by_id(module_id).await? {
        Some(module) => visible_course(&storage, &user, module.course_id)
            .await?
            .is_some(),
        None => false,
    };
    if !visible {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let items = storage.list_documents(module_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        DocumentListResponse { items },
        "Document list retrieved successfully",
    )))
}

pub async fn create_document(
    service: &ModuleService,
    module_id: i64,
    body: CreateDocumentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_module_by_id(module_id).await?.is_none() {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let document = storage.create_document(module_id, body).await?;
    info!("Document {} attached to module {}", document.id, module_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Document, document.id)
            .details(serde_json::json!({ "module_id": module_id, "title": document.title })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        document,
        "Document created successfully",
    )))
}

/// 删除上传目录下的文件，文件丢失只记录警告
pub(super) async fn remove_stored_file(file_path: &str) {
    let path = Path::new(&AppConfig::get().upload.dir).join(file_path);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove document file {}: {}", path.display(), e);
    }
}

/// 删除文档记录及其存储文件
pub async fn delete_document(
    service: &ModuleService,
    document_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let Some(document) = storage.get_document_by_id(document_id).await? else {
        return Ok(not_found(ErrorCode::DocumentNotFound, "Document not found"));
    };

    storage.delete_document(document_id).await?;
    remove_stored_file(&document.file_path).await;
    info!("Document {} deleted", document_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Document, document_id)
            .details(serde_json::json!({
                "module_id": document.module_id,
                "file_path": document.file_path,
            })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Document deleted successfully",
    )))
}

/// 下载文档并累计下载次数
pub async fn download_document(
    service: &ModuleService,
    document_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let Some(document) = storage.get_document_by_id(document_id).await? else {
        return Ok(not_found(ErrorCode::DocumentNotFound, "Document not found"));
    };

    let visible = match storage.get_module_by_id(document.module_id).await? {
        Some(module) => visible_course(&storage, &user, module.course_id)
            .await?
            .is_some(),
        None => false,
    };
    if !visible {
        return Ok(not_found(ErrorCode::DocumentNotFound, "Document not found"));
    }

    if !document.is_downloadable {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::DocumentNotDownloadable,
            "Document is not downloadable",
        )));
    }

    let path = Path::new(&AppConfig::get().upload.dir).join(&document.file_path);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Document file {} is missing", path.display());
            return Ok(not_found(ErrorCode::FileNotFound, "File not found"));
        }
        Err(e) => {
            error!("{}", LmsError::file_operation(format!("{e}")));
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "File read failed",
                )),
            );
        }
    };

    storage.increment_download_count(document_id).await?;

    let extension = extension_of(&document.file_path);
    let file_name = if extension_of(&document.title).is_empty() {
        format!("{}{}", document.title, extension)
    } else {
        document.title.clone()
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&extension)))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    fn document(file_path: &str, is_downloadable: bool) -> CreateDocumentRequest {
        CreateDocumentRequest {
            title: "Handbook".into(),
            file_path: file_path.into(),
            file_type: "application/pdf".into(),
            file_size: 8,
            is_downloadable,
        }
    }

    #[actix_web::test]
    async fn test_download_counts_and_serves_file() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Handbook").await;
        let module = seed_module(&raw, course.id, "Read me").await;
        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();

        let relative = format!("document/test-{}.pdf", uuid::Uuid::new_v4());
        let path = Path::new(&AppConfig::get().upload.dir).join(&relative);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let doc = raw
            .create_document_impl(module.id, document(&relative, true))
            .await
            .unwrap();
        let locked = raw
            .create_document_impl(module.id, document(&relative, false))
            .await
            .unwrap();

        let service = ModuleService::with_storage(storage.clone());
        let req = request_as(&employee, &storage);

        let resp = service.download_document(locked.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = service.download_document(doc.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );

        let stored = raw.get_document_by_id_impl(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 1);

        let resp = service
            .delete_document(doc.id, &request_as(&author, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!path.exists());
    }

    #[actix_web::test]
    async fn test_document_path_must_stay_in_upload_dir() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let course = seed_course(&raw, author.id, "Paths").await;
        let module = seed_module(&raw, course.id, "Intro").await;
        let service = ModuleService::with_storage(storage.clone());

        let resp = service
            .create_document(
                module.id,
                document("../etc/passwd", true),
                &request_as(&author, &storage),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
