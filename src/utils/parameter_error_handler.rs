use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};
use serde_json::error::Category;
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

/// JSON 请求体错误处理
///
/// 语法错误返回 400，结构正确但字段类型不符返回 422，超长返回 413。
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    debug!("JSON payload error on {}: {}", req.path(), err);

    let response = match &err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            HttpResponse::PayloadTooLarge().json(ApiResponse::error_empty(
                ErrorCode::PayloadTooLarge,
                "Request body is too large",
            ))
        }
        JsonPayloadError::ContentType => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::BadRequest, "Content-Type must be application/json"),
        ),
        JsonPayloadError::Deserialize(e) if e.classify() == Category::Data => {
            HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
                ErrorCode::ValidationFailed,
                format!("Invalid request body: {e}"),
            ))
        }
        _ => HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            format!("Malformed JSON: {err}"),
        )),
    };

    InternalError::from_response(err, response).into()
}

/// 查询参数错误处理
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    debug!("Query error on {}: {}", req.path(), err);

    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid query parameters: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
