use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 课程状态
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
    pub enum CourseStatus {
        Draft => "draft",
        UnderReview => "under_review",
        Approved => "approved",
        Published => "published",
        Archived => "archived",
    }
}

define_string_enum! {
    // 课程难度
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
    pub enum DifficultyLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

// 课程实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub creator_id: i64,
    pub status: CourseStatus,
    pub difficulty_level: DifficultyLevel,
    pub estimated_duration: Option<i32>, // 分钟
    pub is_mandatory: bool,
    pub tags: Vec<String>,
    pub prerequisites: Vec<i64>,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }
}
