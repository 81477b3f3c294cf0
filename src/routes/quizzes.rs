use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::quizzes::requests::{
    CreateQuestionRequest, CreateQuizRequest, SubmitAttemptRequest, UpdateQuestionRequest,
    UpdateQuizRequest,
};
use crate::models::rbac::entities::Permission;
use crate::services::QuizService;
use crate::utils::{SafeIDI64, SafeModuleIdI64};

static QUIZ_SERVICE: Lazy<QuizService> = Lazy::new(QuizService::new_lazy);

fn manage() -> RequirePermission {
    RequirePermission::new(Permission::QuizzesManage)
}

pub async fn list_quizzes(
    req: HttpRequest,
    module_id: SafeModuleIdI64,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.list_quizzes(module_id.0, &req).await
}

pub async fn create_quiz(
    req: HttpRequest,
    module_id: SafeModuleIdI64,
    body: web::Json<CreateQuizRequest>,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE
        .create_quiz(module_id.0, body.into_inner(), &req)
        .await
}

pub async fn get_quiz(req: HttpRequest, quiz_id: SafeIDI64) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.get_quiz(quiz_id.0, &req).await
}

pub async fn update_quiz(
    req: HttpRequest,
    quiz_id: SafeIDI64,
    body: web::Json<UpdateQuizRequest>,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE
        .update_quiz(quiz_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_quiz(req: HttpRequest, quiz_id: SafeIDI64) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.delete_quiz(quiz_id.0, &req).await
}

pub async fn create_question(
    req: HttpRequest,
    quiz_id: SafeIDI64,
    body: web::Json<CreateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE
        .create_question(quiz_id.0, body.into_inner(), &req)
        .await
}

pub async fn update_question(
    req: HttpRequest,
    question_id: SafeIDI64,
    body: web::Json<UpdateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE
        .update_question(question_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_question(
    req: HttpRequest,
    question_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.delete_question(question_id.0, &req).await
}

pub async fn start_attempt(req: HttpRequest, quiz_id: SafeIDI64) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.start_attempt(quiz_id.0, &req).await
}

pub async fn list_my_attempts(req: HttpRequest, quiz_id: SafeIDI64) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.list_my_attempts(quiz_id.0, &req).await
}

pub async fn submit_attempt(
    req: HttpRequest,
    attempt_id: SafeIDI64,
    body: web::Json<SubmitAttemptRequest>,
) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE
        .submit_attempt(attempt_id.0, body.into_inner(), &req)
        .await
}

pub async fn get_attempt(req: HttpRequest, attempt_id: SafeIDI64) -> ActixResult<HttpResponse> {
    QUIZ_SERVICE.get_attempt(attempt_id.0, &req).await
}

/// 模块下的测验，需先于 /api/v1/modules 注册
pub fn configure_module_quiz_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/modules/{module_id}/quizzes")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_quizzes))
            .route("", web::post().to(create_quiz).wrap(manage())),
    );
}

pub fn configure_quiz_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/quizzes")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::get().to(get_quiz))
            .route("/{id}", web::put().to(update_quiz).wrap(manage()))
            .route("/{id}", web::delete().to(delete_quiz).wrap(manage()))
            .route(
                "/{id}/questions",
                web::post().to(create_question).wrap(manage()),
            )
            .route("/{id}/attempts", web::post().to(start_attempt))
            .route("/{id}/attempts", web::get().to(list_my_attempts)),
    )
    .service(
        web::scope("/api/v1/questions")
            .wrap(manage())
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::put().to(update_question))
            .route("/{id}", web::delete().to(delete_question)),
    )
    .service(
        web::scope("/api/v1/attempts")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::get().to(get_attempt))
            .route("/{id}/submit", web::post().to(submit_attempt)),
    );
}
