use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    QuizService,
    grading::{self, expired_outcome, grade_attempt, is_time_exceeded},
    quiz_with_module,
};
use crate::errors::{LmsError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    enrollments::entities::EnrollmentStatus,
    quizzes::{
        entities::{Question, QuizAttempt, QuizResponse},
        requests::SubmitAttemptRequest,
        responses::{
            AttemptListResponse, AttemptStartResponse, QuestionView, QuizResultResponse,
            ResponseReview,
        },
    },
    rbac::entities::Permission,
    users::entities::User,
};
use crate::services::modules::visible_course;
use crate::services::{bad_request, not_found};
use crate::storage::Storage;

fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(ErrorCode::Forbidden, message))
}

/// 作答明细对照题目生成复盘
fn build_review(questions: &[Question], responses: &[QuizResponse]) -> Vec<ResponseReview> {
    responses
        .iter()
        .filter_map(|response| {
            let question = questions.iter().find(|q| q.id == response.question_id)?;
            Some(ResponseReview {
                question_id: question.id,
                question_text: question.question_text.clone(),
                question_type: question.question_type,
                selected_option_id: response.question_option_id,
                text_response: response.text_response.clone(),
                is_correct: response.is_correct,
                points_earned: response.points_earned,
                correct_option_ids: question
                    .options
                    .iter()
                    .filter(|o| o.is_correct)
                    .map(|o| o.id)
                    .collect(),
                explanation: question.explanation.clone(),
            })
        })
        .collect()
}

/// 将超时的作答以 0 分结束
async fn expire_attempt(
    storage: &Arc<dyn Storage>,
    attempt: &QuizAttempt,
    questions: &[Question],
) -> Result<()> {
    let time_spent = (chrono::Utc::now() - attempt.started_at).num_seconds();
    match storage
        .finalize_attempt(attempt.id, expired_outcome(questions), time_spent)
        .await
    {
        Ok(_) => {
            warn!("Attempt {} expired and was closed with score 0", attempt.id);
            Ok(())
        }
        // 并发提交已结束该作答
        Err(LmsError::BusinessRule(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// 开始作答
///
/// 已有未超时的作答时直接返回，否则检查次数后新建。
pub async fn start_attempt(
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

    if !user.has_permission(Permission::QuizzesManage) {
        let enrolled = storage
            .get_enrollment(user.id, module.course_id)
            .await?
            .is_some_and(|e| e.status != EnrollmentStatus::Dropped);
        if !enrolled {
            return Ok(bad_request(
                ErrorCode::NotEnrolled,
                "You must be enrolled in this course to take the quiz",
            ));
        }
    }

    let questions = storage.list_questions(quiz_id).await?;
    let mut attempts = storage.list_user_attempts(quiz_id, user.id).await?;
    let now = chrono::Utc::now();

    let open = attempts.iter().find(|a| !a.is_completed()).cloned();
    let attempt = match open {
        Some(open) if !is_time_exceeded(open.started_at, quiz.time_limit, now) => open,
        open => {
            if let Some(expired) = open {
                expire_attempt(&storage, &expired, &questions).await?;
                attempts = storage.list_user_attempts(quiz_id, user.id).await?;
            }
            if attempts.len() as i64 >= quiz.max_attempts as i64 {
                return Ok(bad_request(
                    ErrorCode::MaxAttemptsReached,
                    "Maximum number of attempts reached",
                ));
            }
            let attempt = storage
                .create_attempt(
                    quiz_id,
                    user.id,
                    attempts.len() as i32 + 1,
                    grading::total_points(&questions),
                )
                .await?;
            info!(
                "User {} started attempt {} of quiz {}",
                user.id, attempt.attempt_number, quiz_id
            );
            attempt
        }
    };

    let mut views: Vec<QuestionView> = questions
        .iter()
        .map(|q| QuestionView::from_question(q, false))
        .collect();
    if quiz.randomize_questions {
        views.shuffle(&mut rand::rng());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AttemptStartResponse {
            expires_at: grading::expires_at(attempt.started_at, quiz.time_limit),
            time_limit: quiz.time_limit,
            attempt,
            questions: views,
        },
        "Quiz attempt started",
    )))
}

/// 提交作答并评分，通过后标记模块完成
pub async fn submit_attempt(
    service: &QuizService,
    attempt_id: i64,
    body: SubmitAttemptRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let Some(attempt) = storage.get_attempt_by_id(attempt_id).await? else {
        return Ok(not_found(ErrorCode::AttemptNotFound, "Attempt not found"));
    };
    if attempt.user_id != user.id {
        return Ok(forbidden("You can only submit your own attempts"));
    }
    if attempt.is_completed() {
        return Ok(bad_request(
            ErrorCode::AttemptAlreadySubmitted,
            "Attempt already submitted",
        ));
    }

    let Some((quiz, module)) = quiz_with_module(&storage, attempt.quiz_id).await? else {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    };
    let questions = storage.list_questions(quiz.id).await?;
    let now = chrono::Utc::now();

    if is_time_exceeded(attempt.started_at, quiz.time_limit, now) {
        expire_attempt(&storage, &attempt, &questions).await?;
        return Ok(bad_request(
            ErrorCode::TimeLimitExceeded,
            "Time limit exceeded",
        ));
    }

    let outcome = grade_attempt(&questions, &body.responses, quiz.passing_score);
    let time_spent = (now - attempt.started_at).num_seconds();
    let attempt = match storage.finalize_attempt(attempt_id, outcome, time_spent).await {
        Ok(attempt) => attempt,
        Err(LmsError::BusinessRule(msg)) => {
            return Ok(bad_request(ErrorCode::AttemptAlreadySubmitted, msg));
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "User {} submitted attempt {} of quiz {}: score {:.1}, passed {}",
        user.id,
        attempt.id,
        quiz.id,
        attempt.score.unwrap_or_default(),
        attempt.is_passed
    );

    if attempt.is_passed {
        storage.mark_module_complete(user.id, module.id).await?;
        storage
            .recompute_enrollment_progress(user.id, module.course_id)
            .await?;
    }

    let responses = if quiz.show_results_immediately {
        let stored = storage.list_attempt_responses(attempt.id).await?;
        Some(build_review(&questions, &stored))
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuizResultResponse {
            attempt,
            passing_score: quiz.passing_score,
            responses,
        },
        "Quiz submitted successfully",
    )))
}

pub async fn list_my_attempts(
    service: &QuizService,
    quiz_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    if storage.get_quiz_by_id(quiz_id).await?.is_none() {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    }

    let items = storage.list_user_attempts(quiz_id, user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AttemptListResponse { items },
        "Attempt list retrieved successfully",
    )))
}

fn can_manage(user: &User) -> bool {
    user.has_permission(Permission::QuizzesManage)
}

/// 作答结果，允许复盘或管理者可见明细
pub async fn get_attempt_result(
    service: &QuizService,
    attempt_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let Some(attempt) = storage.get_attempt_by_id(attempt_id).await? else {
        return Ok(not_found(ErrorCode::AttemptNotFound, "Attempt not found"));
    };
    let manager = can_manage(&user);
    if attempt.user_id != user.id && !manager {
        return Ok(forbidden("You can only view your own attempts"));
    }

    let Some(quiz) = storage.get_quiz_by_id(attempt.quiz_id).await? else {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    };

    let responses = if attempt.is_completed() && (quiz.allow_review || manager) {
        let questions = storage.list_questions(quiz.id).await?;
        let stored = storage.list_attempt_responses(attempt.id).await?;
        Some(build_review(&questions, &stored))
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuizResultResponse {
            attempt,
            passing_score: quiz.passing_score,
            responses,
        },
        "Attempt retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::CourseStatus;
    use crate::models::quizzes::{entities::Quiz, requests::AnswerRequest};
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    struct Setup {
        raw: SeaOrmStorage,
        storage: Arc<dyn Storage>,
        learner: User,
        quiz: Quiz,
        course_id: i64,
        module_id: i64,
    }

    async fn setup(settings: serde_json::Value) -> Setup {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let learner = seed_user(&raw, "learner", UserRole::Employee).await;
        let course = seed_course(&raw, author.id, "Quizzes").await;
        let module = seed_module(&raw, course.id, "Check").await;
        seed_module(&raw, course.id, "Reading").await;

        let mut body = serde_json::json!({
            "title": "Basics",
            "questions": [
                {
                    "question_text": "2 + 2?",
                    "question_type": "multiple_choice",
                    "points": 1.0,
                    "options": [
                        {"option_text": "4", "is_correct": true},
                        {"option_text": "5"}
                    ]
                },
                {
                    "question_text": "Why?",
                    "question_type": "short_answer",
                    "points": 1.0
                }
            ]
        });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), settings.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        let quiz = raw
            .create_quiz_impl(module.id, serde_json::from_value(body).unwrap())
            .await
            .unwrap();
        raw.set_course_status_impl(course.id, CourseStatus::Published)
            .await
            .unwrap();

        Setup {
            raw,
            storage,
            learner,
            quiz,
            course_id: course.id,
            module_id: module.id,
        }
    }

    async fn answers(s: &Setup, correct: bool) -> SubmitAttemptRequest {
        let questions = s.raw.list_questions_impl(s.quiz.id).await.unwrap();
        let option = questions[0]
            .options
            .iter()
            .find(|o| o.is_correct == correct)
            .unwrap();
        SubmitAttemptRequest {
            responses: vec![
                AnswerRequest {
                    question_id: questions[0].id,
                    selected_option_id: Some(option.id),
                    text_response: None,
                },
                AnswerRequest {
                    question_id: questions[1].id,
                    selected_option_id: None,
                    text_response: Some("because".into()),
                },
            ],
        }
    }

    async fn start(s: &Setup, service: &QuizService) -> (StatusCode, serde_json::Value) {
        let resp = service
            .start_attempt(s.quiz.id, &request_as(&s.learner, &s.storage))
            .await
            .unwrap();
        let status = resp.status();
        (status, body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_start_requires_enrollment_and_reuses_open_attempt() {
        let s = setup(serde_json::json!({})).await;
        let service = QuizService::with_storage(s.storage.clone());

        let (status, _) = start(&s, &service).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        s.raw
            .create_enrollment_impl(s.learner.id, s.course_id, None, None)
            .await
            .unwrap();
        let (status, first) = start(&s, &service).await;
        assert_eq!(status, StatusCode::OK);
        assert!(first["data"]["questions"][0]["options"][0].get("is_correct").is_none());

        let (_, second) = start(&s, &service).await;
        assert_eq!(first["data"]["attempt"]["id"], second["data"]["attempt"]["id"]);
    }

    #[actix_web::test]
    async fn test_cannot_start_quiz_of_draft_course() {
        let s = setup(serde_json::json!({})).await;
        s.raw
            .create_enrollment_impl(s.learner.id, s.course_id, None, None)
            .await
            .unwrap();
        s.raw
            .set_course_status_impl(s.course_id, CourseStatus::Draft)
            .await
            .unwrap();
        let service = QuizService::with_storage(s.storage.clone());

        let (status, _) = start(&s, &service).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(
            s.raw
                .list_user_attempts_impl(s.quiz.id, s.learner.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[actix_web::test]
    async fn test_pass_completes_module_and_limits_attempts() {
        let s = setup(serde_json::json!({ "max_attempts": 1 })).await;
        s.raw
            .create_enrollment_impl(s.learner.id, s.course_id, None, None)
            .await
            .unwrap();
        let service = QuizService::with_storage(s.storage.clone());
        let req = request_as(&s.learner, &s.storage);

        let (_, started) = start(&s, &service).await;
        let attempt_id = started["data"]["attempt"]["id"].as_i64().unwrap();

        let resp = service
            .submit_attempt(attempt_id, answers(&s, true).await, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["attempt"]["score"], 100.0);
        assert_eq!(body["data"]["attempt"]["is_passed"], true);
        assert_eq!(body["data"]["responses"].as_array().unwrap().len(), 2);

        let progress = s
            .raw
            .list_module_progress_impl(s.learner.id, s.course_id)
            .await
            .unwrap();
        assert!(progress.iter().any(|p| p.module_id == s.module_id));
        let enrollment = s
            .raw
            .get_enrollment_impl(s.learner.id, s.course_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 50.0);

        let resp = service
            .submit_attempt(attempt_id, answers(&s, true).await, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (status, _) = start(&s, &service).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_results_hidden_without_review() {
        let s = setup(serde_json::json!({
            "show_results_immediately": false,
            "allow_review": false
        }))
        .await;
        s.raw
            .create_enrollment_impl(s.learner.id, s.course_id, None, None)
            .await
            .unwrap();
        let service = QuizService::with_storage(s.storage.clone());
        let req = request_as(&s.learner, &s.storage);

        let (_, started) = start(&s, &service).await;
        let attempt_id = started["data"]["attempt"]["id"].as_i64().unwrap();
        let resp = service
            .submit_attempt(attempt_id, answers(&s, false).await, &req)
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["attempt"]["is_passed"], false);
        assert!(body["data"].get("responses").is_none());

        let resp = service.get_attempt(attempt_id, &req).await.unwrap();
        assert!(body_json(resp).await["data"].get("responses").is_none());

        let other = seed_user(&s.raw, "other", UserRole::Employee).await;
        let resp = service
            .submit_attempt(attempt_id, answers(&s, true).await, &request_as(&other, &s.storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
