use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::path::Path;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{AppConfig, UploadConfig};
use crate::errors::LmsError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    files::{requests::UploadKind, responses::FileUploadResponse},
};
use crate::utils::{content_type_for, extension_of, validate_magic_bytes};

/// 该类别允许的扩展名
fn allowed_extensions(config: &UploadConfig, kind: UploadKind) -> &[String] {
    match kind {
        UploadKind::Document => &config.document_types,
        UploadKind::Video => &config.video_types,
        UploadKind::Image => &config.image_types,
    }
}

/// 校验文件名与内容，返回小写扩展名
fn check_file(
    config: &UploadConfig,
    kind: UploadKind,
    file_name: &str,
    data: &[u8],
) -> Result<String, (ErrorCode, &'static str)> {
    let extension = extension_of(file_name);
    if extension.is_empty()
        || !allowed_extensions(config, kind)
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&extension))
    {
        return Err((ErrorCode::FileTypeNotAllowed, "File type not allowed"));
    }
    if data.len() > config.max_size {
        return Err((ErrorCode::FileSizeExceeded, "File size exceeds the limit"));
    }
    if !validate_magic_bytes(data, &extension) {
        return Err((
            ErrorCode::FileTypeNotAllowed,
            "File content does not match its extension",
        ));
    }
    Ok(extension)
}

fn rejected(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

fn upload_failed(e: impl std::fmt::Display) -> HttpResponse {
    error!("{}", LmsError::file_operation(format!("{e}")));
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::FileUploadFailed,
        "File upload failed",
    ))
}

pub async fn handle_upload(
    req: &HttpRequest,
    kind: UploadKind,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let uploader = RequireJWT::current_user(req)?;
    let config = &AppConfig::get().upload;

    let mut received: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }
        if received.is_some() {
            return Ok(rejected(
                ErrorCode::MultifileUploadNotAllowed,
                "Only one file can be uploaded at a time",
            ));
        }

        let original_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_default();
        let declared_type = field.content_type().map(|ct| ct.to_string());

        // 边读边校验大小
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if data.len() + chunk.len() > config.max_size {
                return Ok(rejected(
                    ErrorCode::FileSizeExceeded,
                    "File size exceeds the limit",
                ));
            }
            data.extend_from_slice(&chunk);
        }

        received = Some((original_name, declared_type, data));
    }

    let Some((original_name, declared_type, data)) = received else {
        return Ok(rejected(
            ErrorCode::FileNotFound,
            "No file found in upload payload",
        ));
    };

    let extension = match check_file(config, kind, &original_name, &data) {
        Ok(ext) => ext,
        Err((code, message)) => return Ok(rejected(code, message)),
    };

    let kind_dir = Path::new(&config.dir).join(kind.as_str());
    if let Err(e) = tokio::fs::create_dir_all(&kind_dir).await {
        return Ok(upload_failed(e));
    }

    let stored_name = format!("{}{}", Uuid::new_v4(), extension);
    if let Err(e) = tokio::fs::write(kind_dir.join(&stored_name), &data).await {
        return Ok(upload_failed(e));
    }

    let file_path = format!("{}/{}", kind.as_str(), stored_name);
    info!(
        "User {} uploaded {} ({} bytes) as {}",
        uploader.id,
        original_name,
        data.len(),
        file_path
    );

    let content_type = declared_type
        .filter(|ct| ct != "application/octet-stream")
        .unwrap_or_else(|| content_type_for(&extension).to_string());

    Ok(HttpResponse::Created().json(ApiResponse::success(
        FileUploadResponse {
            file_path,
            file_name: original_name,
            size: data.len() as i64,
            content_type,
            kind,
            uploaded_at: chrono::Utc::now(),
        },
        "File uploaded successfully",
    )))
}
