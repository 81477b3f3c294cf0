use serde::Serialize;
use ts_rs::TS;

use super::requests::UploadKind;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
pub struct FileUploadResponse {
    /// 存储路径（相对上传目录）
    pub file_path: String,
    /// 原始文件名
    pub file_name: String,
    /// 文件大小(字节)
    pub size: i64,
    pub content_type: String,
    pub kind: UploadKind,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}
