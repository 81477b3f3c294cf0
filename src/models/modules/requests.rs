use serde::Deserialize;
use ts_rs::TS;

use super::entities::{ContentType, VideoType};
use crate::utils::validate::validate_title;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct CreateModuleRequest {
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_url: Option<String>,
    pub content_data: Option<serde_json::Value>,
    /// 为 0 时追加到末尾
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
    pub estimated_duration: Option<i32>,
}

fn default_true() -> bool {
    true
}

impl CreateModuleRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("title", &self.title, 200)?;
        if self.order_index < 0 {
            return Err("order_index must not be negative".to_string());
        }
        if let Some(duration) = self.estimated_duration
            && duration <= 0
        {
            return Err("estimated_duration must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct UpdateModuleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    pub content_url: Option<String>,
    pub content_data: Option<serde_json::Value>,
    pub order_index: Option<i32>,
    pub is_mandatory: Option<bool>,
    pub estimated_duration: Option<i32>,
}

impl UpdateModuleRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref title) = self.title {
            validate_title("title", title, 200)?;
        }
        if let Some(order) = self.order_index
            && order < 0
        {
            return Err("order_index must not be negative".to_string());
        }
        Ok(())
    }
}

// 模块重新排序
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct ReorderModulesRequest {
    pub module_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct CreateDocumentRequest {
    pub title: String,
    /// 上传接口返回的存储路径
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    #[serde(default = "default_true")]
    pub is_downloadable: bool,
}

impl CreateDocumentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("title", &self.title, 200)?;
        if self.file_path.trim().is_empty() {
            return Err("file_path must not be empty".to_string());
        }
        // 只接受上传目录内的相对路径
        if self.file_path.contains("..") || self.file_path.starts_with('/') {
            return Err("file_path is invalid".to_string());
        }
        if self.file_size < 0 {
            return Err("file_size must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct CreateVideoRequest {
    pub title: String,
    pub video_url: String,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    #[serde(default = "default_video_type")]
    pub video_type: VideoType,
    #[serde(default)]
    pub quality_options: Vec<String>,
    pub subtitles_url: Option<String>,
}

fn default_video_type() -> VideoType {
    VideoType::Uploaded
}

impl CreateVideoRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("title", &self.title, 200)?;
        if self.video_url.trim().is_empty() {
            return Err("video_url must not be empty".to_string());
        }
        if let Some(duration) = self.duration
            && duration < 0
        {
            return Err("duration must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub video_type: Option<VideoType>,
    pub quality_options: Option<Vec<String>>,
    pub subtitles_url: Option<String>,
}

impl UpdateVideoRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref title) = self.title {
            validate_title("title", title, 200)?;
        }
        if let Some(ref url) = self.video_url
            && url.trim().is_empty()
        {
            return Err("video_url must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path_traversal_rejected() {
        let req = CreateDocumentRequest {
            title: "Handbook".into(),
            file_path: "../etc/passwd".into(),
            file_type: ".pdf".into(),
            file_size: 10,
            is_downloadable: true,
        };
        assert!(req.validate().is_err());

        let ok = CreateDocumentRequest {
            file_path: "document/abc.pdf".into(),
            ..req
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_module_defaults() {
        let req: CreateModuleRequest =
            serde_json::from_str(r#"{"title":"Intro","content_type":"video"}"#).unwrap();
        assert_eq!(req.order_index, 0);
        assert!(req.is_mandatory);
        assert_eq!(req.content_type, ContentType::Video);
    }
}
