use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use chrono::{DateTime, Utc};

use super::{QuizService, grading::is_time_exceeded, quiz_with_module};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    quizzes::{
        entities::QuizAttempt,
        responses::{QuestionView, QuizDetailResponse},
    },
    rbac::entities::Permission,
};
use crate::services::modules::visible_course;
use crate::services::not_found;

/// 已完成作答中的最高分
pub(crate) fn best_score(attempts: &[QuizAttempt]) -> Option<f64> {
    attempts
        .iter()
        .filter_map(|a| a.score)
        .fold(None, |best, score| Some(best.map_or(score, |b: f64| b.max(score))))
}

/// 还能否作答：有未超时的未完成作答，或次数未用完
///
/// 超时的未完成作答会在下次开始时结算，仍占用一次次数。
pub(crate) fn can_attempt(
    attempts: &[QuizAttempt],
    max_attempts: i32,
    time_limit: Option<i32>,
    now: DateTime<Utc>,
) -> bool {
    attempts
        .iter()
        .any(|a| !a.is_completed() && !is_time_exceeded(a.started_at, time_limit, now))
        || (attempts.len() as i64) < max_attempts as i64
}

pub async fn get_quiz(
    service: &QuizService,
    quiz_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let Some((quiz, module)) = quiz_with_module(&storage, quiz_id).await? else {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    };
    if visible_course(&storage, &user, module.course_id)
        .await?
        .is_none()
    {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    }

    let include_answers = user.has_permission(Permission::QuizzesManage);
    let questions = storage
        .list_questions(quiz_id)
        .await?
        .iter()
        .map(|q| QuestionView::from_question(q, include_answers))
        .collect();
    let attempts = storage.list_user_attempts(quiz_id, user.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuizDetailResponse {
            user_attempts: attempts.len() as i64,
            best_score: best_score(&attempts),
            can_attempt: can_attempt(
                &attempts,
                quiz.max_attempts,
                quiz.time_limit,
                chrono::Utc::now(),
            ),
            quiz,
            module_title: module.title,
            questions,
        },
        "Quiz retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};

    #[actix_web::test]
    async fn test_answers_hidden_from_learners() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let employee = seed_user(&raw, "emp", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Quizzes").await;
        let module = seed_module(&raw, course.id, "Check").await;
        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();
        let quiz = raw
            .create_quiz_impl(
                module.id,
                serde_json::from_value(serde_json::json!({
                    "title": "Basics",
                    "max_attempts": 1,
                    "questions": [{
                        "question_text": "2 + 2?",
                        "question_type": "multiple_choice",
                        "explanation": "Arithmetic",
                        "options": [
                            {"option_text": "4", "is_correct": true},
                            {"option_text": "5"}
                        ]
                    }]
                }))
                .unwrap(),
            )
            .await
            .unwrap();

        let service = QuizService::with_storage(storage.clone());

        let resp = service
            .get_quiz(quiz.id, &request_as(&employee, &storage))
            .await
            .unwrap();
        let body = body_json(resp).await;
        let option = &body["data"]["questions"][0]["options"][0];
        assert!(option.get("is_correct").is_none());
        assert!(body["data"]["questions"][0].get("explanation").is_none());
        assert_eq!(body["data"]["module_title"], "Check");
        assert_eq!(body["data"]["can_attempt"], true);

        let resp = service
            .get_quiz(quiz.id, &request_as(&author, &storage))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["questions"][0]["options"][0]["is_correct"], true);
    }

    #[test]
    fn test_best_score_and_can_attempt() {
        let now = chrono::Utc::now();
        let attempt = |score: Option<f64>| QuizAttempt {
            id: 1,
            quiz_id: 1,
            user_id: 1,
            attempt_number: 1,
            score,
            total_points: 10.0,
            earned_points: 0.0,
            is_passed: false,
            started_at: chrono::Utc::now(),
            completed_at: score.map(|_| chrono::Utc::now()),
            time_spent: 0,
        };
        let attempts = vec![attempt(Some(40.0)), attempt(Some(80.0))];
        assert_eq!(best_score(&attempts), Some(80.0));
        assert!(!can_attempt(&attempts, 2, None, now));
        assert!(can_attempt(&attempts, 3, None, now));
        assert_eq!(best_score(&[]), None);
        assert!(can_attempt(&[attempt(None)], 1, None, now));
    }

    #[test]
    fn test_expired_open_attempt_uses_up_last_try() {
        let open = QuizAttempt {
            id: 1,
            quiz_id: 1,
            user_id: 1,
            attempt_number: 1,
            score: None,
            total_points: 10.0,
            earned_points: 0.0,
            is_passed: false,
            started_at: chrono::Utc::now() - chrono::Duration::hours(2),
            completed_at: None,
            time_spent: 0,
        };
        let now = chrono::Utc::now();
        assert!(!can_attempt(std::slice::from_ref(&open), 1, Some(10), now));
        assert!(can_attempt(std::slice::from_ref(&open), 2, Some(10), now));
        // 无时限的未完成作答可继续
        assert!(can_attempt(&[open], 1, None, now));
    }
}
