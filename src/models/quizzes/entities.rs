use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 题目类型
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
    pub enum QuestionType {
        MultipleChoice => "multiple_choice",
        TrueFalse => "true_false",
        ShortAnswer => "short_answer",
        Essay => "essay",
    }
}

impl QuestionType {
    /// 是否通过选项作答
    pub fn uses_options(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

// 测验
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct Quiz {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_limit: Option<i32>, // 分钟
    pub max_attempts: i32,
    pub passing_score: f64, // 百分比
    pub randomize_questions: bool,
    pub show_results_immediately: bool,
    pub allow_review: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 题目
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: f64,
    pub order_index: i32,
    pub explanation: Option<String>,
    pub options: Vec<QuestionOption>,
}

// 选项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub option_text: String,
    pub is_correct: bool,
    pub order_index: i32,
}

// 测验作答记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub attempt_number: i32,
    pub score: Option<f64>, // 百分比，提交后才有
    pub total_points: f64,
    pub earned_points: f64,
    pub is_passed: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub time_spent: i64, // 秒
}

impl QuizAttempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

// 单题作答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizResponse {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub question_option_id: Option<i64>,
    pub text_response: Option<String>,
    pub is_correct: Option<bool>,
    pub points_earned: f64,
}

/// 一次作答的评分结果，提交时整体写入
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub total_points: f64,
    pub earned_points: f64,
    pub score: f64,
    pub is_passed: bool,
    pub responses: Vec<QuizResponse>,
}
