use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 模块内容类型
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
    pub enum ContentType {
        Video => "video",
        Document => "document",
        Quiz => "quiz",
        Webinar => "webinar",
        Interactive => "interactive",
    }
}

define_string_enum! {
    // 视频来源
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
    pub enum VideoType {
        Uploaded => "uploaded",
        Youtube => "youtube",
        Vimeo => "vimeo",
        Streaming => "streaming",
    }
}

// 课程模块
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct Module {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_url: Option<String>,
    pub content_data: Option<serde_json::Value>,
    pub order_index: i32,
    pub is_mandatory: bool,
    pub estimated_duration: Option<i32>, // 分钟
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 模块文档
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct Document {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub download_count: i64,
    pub is_downloadable: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 模块视频
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct Video {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub video_url: String,
    pub duration: Option<i32>, // 秒
    pub thumbnail_url: Option<String>,
    pub video_type: VideoType,
    pub quality_options: Vec<String>,
    pub subtitles_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
