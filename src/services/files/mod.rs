pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::files::requests::UploadQuery;

/// 文件上传服务，只写磁盘不落库
pub struct FileService;

impl FileService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 处理文件上传
    pub async fn handle_upload(
        &self,
        request: &HttpRequest,
        query: UploadQuery,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(request, query.kind, payload).await
    }
}
