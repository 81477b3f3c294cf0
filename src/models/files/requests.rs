use serde::Deserialize;
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 上传文件类别
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
    pub enum UploadKind {
        Document => "document",
        Video => "video",
        Image => "image",
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
pub struct UploadQuery {
    pub kind: UploadKind,
}
