use serde::Serialize;
use ts_rs::TS;

use super::entities::{Document, Module, Video};

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct ModuleListResponse {
    pub items: Vec<Module>,
}

// 模块详情，附带文档和视频
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct ModuleDetailResponse {
    pub module: Module,
    pub documents: Vec<Document>,
    pub videos: Vec<Video>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct DocumentListResponse {
    pub items: Vec<Document>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/module.ts")]
pub struct VideoListResponse {
    pub items: Vec<Video>,
}
