use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::QuizService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    quizzes::{
        requests::{
            CreateQuestionRequest, CreateQuizRequest, UpdateQuestionRequest, UpdateQuizRequest,
        },
        responses::QuizListResponse,
    },
};
use crate::services::audit::{AuditAction, AuditEntity, AuditEvent, record_audit};
use crate::services::modules::visible_course;
use crate::services::{bad_request, not_found, validation_failed};

pub async fn list_quizzes(
    service: &QuizService,
    module_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::current_user(request)?;
    let storage = service.get_storage(request)?;

    let visible = match storage.get_module_by_id(module_id).await? {
        Some(module) => visible_course(&storage, &user, module.course_id)
            .await?
            .is_some(),
        None => false,
    };
    if !visible {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let items = storage.list_quiz_summaries(module_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuizListResponse { items },
        "Quiz list retrieved successfully",
    )))
}

/// 创建测验，可同时创建题目与选项
pub async fn create_quiz(
    service: &QuizService,
    module_id: i64,
    body: CreateQuizRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_module_by_id(module_id).await?.is_none() {
        return Ok(not_found(ErrorCode::ModuleNotFound, "Module not found"));
    }

    let quiz = storage.create_quiz(module_id, body).await?;
    info!("Quiz {} created in module {}", quiz.id, module_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Quiz, quiz.id)
            .details(serde_json::json!({ "module_id": module_id, "title": quiz.title })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        quiz,
        "Quiz created successfully",
    )))
}

pub async fn update_quiz(
    service: &QuizService,
    quiz_id: i64,
    body: UpdateQuizRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    let Some(quiz) = storage.update_quiz(quiz_id, body).await? else {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    };
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Quiz, quiz.id).details(
            serde_json::json!({ "title": quiz.title, "time_limit": quiz.time_limit }),
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        quiz,
        "Quiz updated successfully",
    )))
}

/// 已有作答记录的测验不能删除
pub async fn delete_quiz(
    service: &QuizService,
    quiz_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if storage.get_quiz_by_id(quiz_id).await?.is_none() {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    }
    if storage.count_quiz_attempts(quiz_id).await? > 0 {
        return Ok(bad_request(
            ErrorCode::QuizHasAttempts,
            "Cannot delete quiz with existing attempts",
        ));
    }

    storage.delete_quiz(quiz_id).await?;
    info!("Quiz {} deleted", quiz_id);
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Quiz, quiz_id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Quiz deleted successfully",
    )))
}

pub async fn create_question(
    service: &QuizService,
    quiz_id: i64,
    body: CreateQuestionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = body.validate() {
        return Ok(validation_failed(msg));
    }

    let storage = service.get_storage(request)?;
    if storage.get_quiz_by_id(quiz_id).await?.is_none() {
        return Ok(not_found(ErrorCode::QuizNotFound, "Quiz not found"));
    }

    let question = storage.create_question(quiz_id, body).await?;
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Create, AuditEntity::Question, question.id)
            .details(serde_json::json!({ "quiz_id": quiz_id })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        question,
        "Question created successfully",
    )))
}

/// 更新题目，选项按原题型校验
pub async fn update_question(
    service: &QuizService,
    question_id: i64,
    body: UpdateQuestionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let Some(question) = storage.get_question_by_id(question_id).await? else {
        return Ok(not_found(ErrorCode::QuestionNotFound, "Question not found"));
    };
    if let Err(msg) = body.validate(question.question_type) {
        return Ok(validation_failed(msg));
    }

    let Some(question) = storage.update_question(question_id, body).await? else {
        return Ok(not_found(ErrorCode::QuestionNotFound, "Question not found"));
    };
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Update, AuditEntity::Question, question.id)
            .details(serde_json::json!({ "quiz_id": question.quiz_id })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        question,
        "Question updated successfully",
    )))
}

pub async fn delete_question(
    service: &QuizService,
    question_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    if !storage.delete_question(question_id).await? {
        return Ok(not_found(ErrorCode::QuestionNotFound, "Question not found"));
    }
    record_audit(
        &storage,
        request,
        AuditEvent::new(AuditAction::Delete, AuditEntity::Question, question_id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
        "Question deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, memory_storage, request_as};
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};
    use actix_web::http::StatusCode;

    fn quiz_body(value: serde_json::Value) -> CreateQuizRequest {
        serde_json::from_value(value).unwrap()
    }

    #[actix_web::test]
    async fn test_create_quiz_validates_options() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let course = seed_course(&raw, author.id, "Quizzes").await;
        let module = seed_module(&raw, course.id, "Check").await;
        let service = QuizService::with_storage(storage.clone());
        let req = request_as(&author, &storage);

        let invalid = quiz_body(serde_json::json!({
            "title": "Broken",
            "questions": [{
                "question_text": "True?",
                "question_type": "true_false",
                "options": [{"option_text": "True", "is_correct": true}]
            }]
        }));
        let resp = service.create_quiz(module.id, invalid, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let valid = quiz_body(serde_json::json!({ "title": "Fine" }));
        let resp = service.create_quiz(module.id, valid, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["max_attempts"], 3);
        assert_eq!(body["data"]["allow_review"], true);
    }

    #[actix_web::test]
    async fn test_quiz_with_attempts_cannot_be_deleted() {
        let (raw, storage) = memory_storage().await;
        let author = seed_user(&raw, "author", UserRole::ResourcePersonnel).await;
        let course = seed_course(&raw, author.id, "Quizzes").await;
        let module = seed_module(&raw, course.id, "Check").await;
        let quiz = raw
            .create_quiz_impl(module.id, quiz_body(serde_json::json!({ "title": "Taken" })))
            .await
            .unwrap();
        raw.create_attempt_impl(quiz.id, author.id, 1, 0.0)
            .await
            .unwrap();

        let service = QuizService::with_storage(storage.clone());
        let resp = service
            .delete_quiz(quiz.id, &request_as(&author, &storage))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
