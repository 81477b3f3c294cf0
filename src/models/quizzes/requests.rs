use serde::Deserialize;
use ts_rs::TS;

use super::entities::QuestionType;
use crate::utils::validate::validate_title;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct CreateOptionRequest {
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct CreateQuestionRequest {
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default = "default_points")]
    pub points: f64,
    /// 为 0 时追加到末尾
    #[serde(default)]
    pub order_index: i32,
    pub explanation: Option<String>,
    #[serde(default)]
    pub options: Vec<CreateOptionRequest>,
}

fn default_points() -> f64 {
    1.0
}

impl CreateQuestionRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("question_text must not be empty".to_string());
        }
        if !(self.points > 0.0) || !self.points.is_finite() {
            return Err("points must be greater than 0".to_string());
        }
        if self.options.iter().any(|o| o.option_text.trim().is_empty()) {
            return Err("option_text must not be empty".to_string());
        }
        validate_options(self.question_type, &self.options)
    }
}

/// 按题型校验选项
pub fn validate_options(
    question_type: QuestionType,
    options: &[CreateOptionRequest],
) -> Result<(), String> {
    let correct = options.iter().filter(|o| o.is_correct).count();
    match question_type {
        QuestionType::MultipleChoice => {
            if options.len() < 2 {
                return Err("Multiple choice questions must have at least 2 options".to_string());
            }
            if correct == 0 {
                return Err(
                    "Multiple choice questions must have at least one correct option".to_string(),
                );
            }
        }
        QuestionType::TrueFalse => {
            if options.len() != 2 {
                return Err("True/False questions must have exactly 2 options".to_string());
            }
            if correct != 1 {
                return Err("True/False questions must have exactly one correct option".to_string());
            }
        }
        QuestionType::ShortAnswer | QuestionType::Essay => {
            if !options.is_empty() {
                return Err("Short answer and essay questions should not have options".to_string());
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct CreateQuizRequest {
    pub title: String,
    pub description: Option<String>,
    pub time_limit: Option<i32>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default = "default_true")]
    pub show_results_immediately: bool,
    #[serde(default = "default_true")]
    pub allow_review: bool,
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

fn default_max_attempts() -> i32 {
    3
}

fn default_passing_score() -> f64 {
    70.0
}

fn default_true() -> bool {
    true
}

fn validate_quiz_settings(
    time_limit: Option<i32>,
    max_attempts: Option<i32>,
    passing_score: Option<f64>,
) -> Result<(), String> {
    if let Some(limit) = time_limit
        && limit <= 0
    {
        return Err("time_limit must be greater than 0".to_string());
    }
    if let Some(attempts) = max_attempts
        && attempts <= 0
    {
        return Err("max_attempts must be greater than 0".to_string());
    }
    if let Some(score) = passing_score
        && !(0.0..=100.0).contains(&score)
    {
        return Err("passing_score must be between 0 and 100".to_string());
    }
    Ok(())
}

impl CreateQuizRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("title", &self.title, 200)?;
        validate_quiz_settings(
            self.time_limit,
            Some(self.max_attempts),
            Some(self.passing_score),
        )?;
        for (idx, question) in self.questions.iter().enumerate() {
            question
                .validate()
                .map_err(|e| format!("questions[{idx}]: {e}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// 缺省时不修改，显式 null 时取消时限
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[ts(optional)]
    pub time_limit: Option<Option<i32>>,
    pub max_attempts: Option<i32>,
    pub passing_score: Option<f64>,
    pub randomize_questions: Option<bool>,
    pub show_results_immediately: Option<bool>,
    pub allow_review: Option<bool>,
}

impl UpdateQuizRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref title) = self.title {
            validate_title("title", title, 200)?;
        }
        validate_quiz_settings(
            self.time_limit.flatten(),
            self.max_attempts,
            self.passing_score,
        )
    }
}

// 区分缺省字段与显式 null
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub points: Option<f64>,
    pub order_index: Option<i32>,
    pub explanation: Option<String>,
    /// 提供时整体替换选项
    pub options: Option<Vec<CreateOptionRequest>>,
}

impl UpdateQuestionRequest {
    pub fn validate(&self, question_type: QuestionType) -> Result<(), String> {
        if let Some(ref text) = self.question_text
            && text.trim().is_empty()
        {
            return Err("question_text must not be empty".to_string());
        }
        if let Some(points) = self.points
            && (!(points > 0.0) || !points.is_finite())
        {
            return Err("points must be greater than 0".to_string());
        }
        if let Some(ref options) = self.options {
            validate_options(question_type, options)?;
        }
        Ok(())
    }
}

// 单题作答
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct AnswerRequest {
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub text_response: Option<String>,
}

// 提交测验
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/quiz.ts")]
pub struct SubmitAttemptRequest {
    pub responses: Vec<AnswerRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(text: &str, correct: bool) -> CreateOptionRequest {
        CreateOptionRequest {
            option_text: text.into(),
            is_correct: correct,
            order_index: 0,
        }
    }

    #[test]
    fn test_multiple_choice_requires_correct_option() {
        let opts = vec![option("a", false), option("b", false)];
        assert!(validate_options(QuestionType::MultipleChoice, &opts).is_err());
        let opts = vec![option("a", true), option("b", false)];
        assert!(validate_options(QuestionType::MultipleChoice, &opts).is_ok());
        assert!(validate_options(QuestionType::MultipleChoice, &[option("a", true)]).is_err());
    }

    #[test]
    fn test_true_false_requires_exactly_one_correct() {
        let opts = vec![option("true", true), option("false", true)];
        assert!(validate_options(QuestionType::TrueFalse, &opts).is_err());
        let opts = vec![option("true", true), option("false", false)];
        assert!(validate_options(QuestionType::TrueFalse, &opts).is_ok());
    }

    #[test]
    fn test_text_questions_reject_options() {
        assert!(validate_options(QuestionType::Essay, &[]).is_ok());
        assert!(validate_options(QuestionType::ShortAnswer, &[option("x", true)]).is_err());
    }

    #[test]
    fn test_quiz_defaults_and_bounds() {
        let req: CreateQuizRequest = serde_json::from_str(r#"{"title":"Check"}"#).unwrap();
        assert_eq!(req.max_attempts, 3);
        assert_eq!(req.passing_score, 70.0);
        assert!(req.show_results_immediately);
        assert!(req.allow_review);
        assert!(req.validate().is_ok());

        let req = CreateQuizRequest {
            passing_score: 120.0,
            ..req
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_question_points_must_be_positive() {
        let req = CreateQuestionRequest {
            question_text: "2 + 2?".into(),
            question_type: QuestionType::ShortAnswer,
            points: 0.0,
            order_index: 0,
            explanation: None,
            options: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_time_limit_null_differs_from_absent() {
        let req: UpdateQuizRequest = serde_json::from_str(r#"{"title":"Check"}"#).unwrap();
        assert_eq!(req.time_limit, None);

        let req: UpdateQuizRequest = serde_json::from_str(r#"{"time_limit":null}"#).unwrap();
        assert_eq!(req.time_limit, Some(None));
        assert!(req.validate().is_ok());

        let req: UpdateQuizRequest = serde_json::from_str(r#"{"time_limit":15}"#).unwrap();
        assert_eq!(req.time_limit, Some(Some(15)));

        let req: UpdateQuizRequest = serde_json::from_str(r#"{"time_limit":0}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
