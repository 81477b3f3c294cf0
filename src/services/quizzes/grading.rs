//! 测验评分
//!
//! 纯函数，不访问存储，便于单独测试。

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::models::quizzes::{
    entities::{AttemptOutcome, Question, QuizResponse},
    requests::AnswerRequest,
};

/// 超时判定的宽限秒数
pub const TIME_LIMIT_GRACE_SECONDS: i64 = 30;

/// 题目总分
pub fn total_points(questions: &[Question]) -> f64 {
    questions.iter().map(|q| q.points).sum()
}

/// 作答截止时间（不含宽限）
pub fn expires_at(started_at: DateTime<Utc>, time_limit: Option<i32>) -> Option<DateTime<Utc>> {
    time_limit.map(|minutes| started_at + Duration::minutes(minutes as i64))
}

/// 是否已超过时限加宽限
pub fn is_time_exceeded(
    started_at: DateTime<Utc>,
    time_limit: Option<i32>,
    now: DateTime<Utc>,
) -> bool {
    expires_at(started_at, time_limit)
        .is_some_and(|deadline| now > deadline + Duration::seconds(TIME_LIMIT_GRACE_SECONDS))
}

/// 超时作答的结果：忽略全部作答，得分为 0
pub fn expired_outcome(questions: &[Question]) -> AttemptOutcome {
    AttemptOutcome {
        total_points: total_points(questions),
        earned_points: 0.0,
        score: 0.0,
        is_passed: false,
        responses: Vec::new(),
    }
}

/// 评分
///
/// 每题只取第一条作答，未知题目忽略，未作答得 0 分。
pub fn grade_attempt(
    questions: &[Question],
    answers: &[AnswerRequest],
    passing_score: f64,
) -> AttemptOutcome {
    let total = total_points(questions);
    let mut seen = HashSet::new();
    let mut responses = Vec::new();
    let mut earned = 0.0;

    for answer in answers {
        let Some(question) = questions.iter().find(|q| q.id == answer.question_id) else {
            continue;
        };
        if !seen.insert(question.id) {
            continue;
        }

        let (is_correct, points) = if question.question_type.uses_options() {
            let correct = answer.selected_option_id.is_some_and(|selected| {
                question
                    .options
                    .iter()
                    .any(|o| o.id == selected && o.is_correct)
            });
            (correct, if correct { question.points } else { 0.0 })
        } else {
            let answered = answer
                .text_response
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty());
            (answered, if answered { question.points } else { 0.0 })
        };

        earned += points;
        responses.push(QuizResponse {
            id: 0,
            attempt_id: 0,
            question_id: question.id,
            question_option_id: if question.question_type.uses_options() {
                answer.selected_option_id
            } else {
                None
            },
            text_response: if question.question_type.uses_options() {
                None
            } else {
                answer.text_response.clone()
            },
            is_correct: Some(is_correct),
            points_earned: points,
        });
    }

    let earned_points = earned.clamp(0.0, total);
    let score = if total > 0.0 {
        earned_points / total * 100.0
    } else {
        0.0
    };

    AttemptOutcome {
        total_points: total,
        earned_points,
        score,
        is_passed: score >= passing_score,
        responses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quizzes::entities::{QuestionOption, QuestionType};

    fn option(id: i64, question_id: i64, is_correct: bool) -> QuestionOption {
        QuestionOption {
            id,
            question_id,
            option_text: format!("option {id}"),
            is_correct,
            order_index: id as i32,
        }
    }

    fn question(id: i64, question_type: QuestionType, points: f64) -> Question {
        let options = if question_type.uses_options() {
            vec![option(id * 10 + 1, id, true), option(id * 10 + 2, id, false)]
        } else {
            vec![]
        };
        Question {
            id,
            quiz_id: 1,
            question_text: format!("question {id}"),
            question_type,
            points,
            order_index: id as i32,
            explanation: None,
            options,
        }
    }

    fn choose(question_id: i64, option_id: i64) -> AnswerRequest {
        AnswerRequest {
            question_id,
            selected_option_id: Some(option_id),
            text_response: None,
        }
    }

    fn write(question_id: i64, text: &str) -> AnswerRequest {
        AnswerRequest {
            question_id,
            selected_option_id: None,
            text_response: Some(text.to_string()),
        }
    }

    fn quiz() -> Vec<Question> {
        vec![
            question(1, QuestionType::MultipleChoice, 2.0),
            question(2, QuestionType::TrueFalse, 1.0),
            question(3, QuestionType::Essay, 1.0),
        ]
    }

    #[test]
    fn test_all_correct_passes() {
        let outcome = grade_attempt(
            &quiz(),
            &[choose(1, 11), choose(2, 21), write(3, "because")],
            70.0,
        );
        assert_eq!(outcome.total_points, 4.0);
        assert_eq!(outcome.earned_points, 4.0);
        assert_eq!(outcome.score, 100.0);
        assert!(outcome.is_passed);
        assert_eq!(outcome.responses.len(), 3);
    }

    #[test]
    fn test_partial_score_below_passing() {
        let outcome = grade_attempt(&quiz(), &[choose(1, 11), choose(2, 22)], 70.0);
        assert_eq!(outcome.earned_points, 2.0);
        assert_eq!(outcome.score, 50.0);
        assert!(!outcome.is_passed);
    }

    #[test]
    fn test_option_of_other_question_is_wrong() {
        let outcome = grade_attempt(&quiz(), &[choose(2, 11)], 0.0);
        assert_eq!(outcome.earned_points, 0.0);
        assert_eq!(outcome.responses[0].is_correct, Some(false));
    }

    #[test]
    fn test_first_response_counts_and_unknown_ignored() {
        let outcome = grade_attempt(
            &quiz(),
            &[choose(1, 12), choose(1, 11), choose(99, 1), write(3, "   ")],
            70.0,
        );
        assert_eq!(outcome.earned_points, 0.0);
        assert_eq!(outcome.responses.len(), 2);
        assert_eq!(outcome.responses[0].question_option_id, Some(12));
    }

    #[test]
    fn test_empty_quiz_scores_zero() {
        let outcome = grade_attempt(&[], &[], 0.0);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.is_passed);
    }

    #[test]
    fn test_time_limit_grace() {
        let started = Utc::now() - Duration::minutes(10);
        assert!(!is_time_exceeded(started, None, Utc::now()));
        assert!(!is_time_exceeded(started, Some(10), started + Duration::minutes(10) + Duration::seconds(20)));
        assert!(is_time_exceeded(started, Some(10), started + Duration::minutes(10) + Duration::seconds(31)));
        assert_eq!(
            expires_at(started, Some(10)),
            Some(started + Duration::minutes(10))
        );
    }
}
