use serde::Serialize;
use ts_rs::TS;

use super::entities::{Question, QuestionType, Quiz, QuizAttempt};

// 测验摘要
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizSummary {
    pub quiz: Quiz,
    pub total_questions: i64,
    pub total_points: f64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizListResponse {
    pub items: Vec<QuizSummary>,
}

// 面向作答者的选项视图，非管理者不返回正确答案
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct OptionView {
    pub id: i64,
    pub option_text: String,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuestionView {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: f64,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    /// include_answers 为 false 时隐藏正确答案与解析
    pub fn from_question(question: &Question, include_answers: bool) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text.clone(),
            question_type: question.question_type,
            points: question.points,
            order_index: question.order_index,
            explanation: if include_answers {
                question.explanation.clone()
            } else {
                None
            },
            options: question
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id,
                    option_text: o.option_text.clone(),
                    order_index: o.order_index,
                    is_correct: include_answers.then_some(o.is_correct),
                })
                .collect(),
        }
    }
}

// 测验详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizDetailResponse {
    pub quiz: Quiz,
    pub module_title: String,
    pub questions: Vec<QuestionView>,
    pub user_attempts: i64,
    pub best_score: Option<f64>,
    pub can_attempt: bool,
}

// 开始作答
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct AttemptStartResponse {
    pub attempt: QuizAttempt,
    pub time_limit: Option<i32>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub questions: Vec<QuestionView>,
}

// 单题复盘
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct ResponseReview {
    pub question_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub selected_option_id: Option<i64>,
    pub text_response: Option<String>,
    pub is_correct: Option<bool>,
    pub points_earned: f64,
    pub correct_option_ids: Vec<i64>,
    pub explanation: Option<String>,
}

// 作答结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct QuizResultResponse {
    pub attempt: QuizAttempt,
    pub passing_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<ResponseReview>>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct AttemptListResponse {
    pub items: Vec<QuizAttempt>,
}
