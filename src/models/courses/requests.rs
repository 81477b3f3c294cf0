use serde::Deserialize;
use ts_rs::TS;

use super::entities::{CourseStatus, DifficultyLevel};
use crate::utils::validate::validate_title;

// 课程列表查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<CourseStatus>,
    pub difficulty: Option<DifficultyLevel>,
    pub is_mandatory: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: DifficultyLevel,
    pub estimated_duration: Option<i32>,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<i64>,
    pub thumbnail_url: Option<String>,
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Beginner
}

impl CreateCourseRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("title", &self.title, 200)?;
        if let Some(duration) = self.estimated_duration
            && duration <= 0
        {
            return Err("estimated_duration must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub estimated_duration: Option<i32>,
    pub is_mandatory: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub prerequisites: Option<Vec<i64>>,
    pub thumbnail_url: Option<String>,
}

impl UpdateCourseRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref title) = self.title {
            validate_title("title", title, 200)?;
        }
        if let Some(duration) = self.estimated_duration
            && duration <= 0
        {
            return Err("estimated_duration must be greater than 0".to_string());
        }
        Ok(())
    }
}

// 批量选课请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct BulkEnrollRequest {
    pub user_ids: Vec<i64>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl BulkEnrollRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_ids.is_empty() {
            return Err("user_ids must not be empty".to_string());
        }
        if self.user_ids.len() > 500 {
            return Err("Cannot enroll more than 500 users at once".to_string());
        }
        Ok(())
    }
}

// 课程列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<CourseStatus>,
    pub difficulty: Option<DifficultyLevel>,
    pub is_mandatory: Option<bool>,
}

impl From<CourseListParams> for CourseListQuery {
    fn from(params: CourseListParams) -> Self {
        Self {
            page: params.page,
            size: params.size,
            search: params.search,
            category_id: params.category_id,
            status: params.status,
            difficulty: params.difficulty,
            is_mandatory: params.is_mandatory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_course_defaults() {
        let req: CreateCourseRequest =
            serde_json::from_str(r#"{"title":"Onboarding"}"#).unwrap();
        assert_eq!(req.difficulty_level, DifficultyLevel::Beginner);
        assert!(!req.is_mandatory);
        assert!(req.tags.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_course_rejects_blank_title() {
        let req: CreateCourseRequest = serde_json::from_str(r#"{"title":"  "}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bulk_enroll_requires_users() {
        let req = BulkEnrollRequest {
            user_ids: vec![],
            due_date: None,
        };
        assert!(req.validate().is_err());
    }
}
