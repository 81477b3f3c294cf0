pub mod attempts;
pub mod detail;
pub mod grading;
pub mod manage;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::declare_service;
use crate::errors::Result;
use crate::models::{
    modules::entities::Module,
    quizzes::{
        entities::Quiz,
        requests::{
            CreateQuestionRequest, CreateQuizRequest, SubmitAttemptRequest,
            UpdateQuestionRequest, UpdateQuizRequest,
        },
    },
};
use crate::storage::Storage;

declare_service!(QuizService);

impl QuizService {
    // 模块下的测验
    pub async fn list_quizzes(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::list_quizzes(self, module_id, request).await
    }

    pub async fn create_quiz(
        &self,
        module_id: i64,
        body: CreateQuizRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_quiz(self, module_id, body, request).await
    }

    pub async fn get_quiz(&self, quiz_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        detail::get_quiz(self, quiz_id, request).await
    }

    pub async fn update_quiz(
        &self,
        quiz_id: i64,
        body: UpdateQuizRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_quiz(self, quiz_id, body, request).await
    }

    pub async fn delete_quiz(
        &self,
        quiz_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::delete_quiz(self, quiz_id, request).await
    }

    // 题目
    pub async fn create_question(
        &self,
        quiz_id: i64,
        body: CreateQuestionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_question(self, quiz_id, body, request).await
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        body: UpdateQuestionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_question(self, question_id, body, request).await
    }

    pub async fn delete_question(
        &self,
        question_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::delete_question(self, question_id, request).await
    }

    // 作答
    pub async fn start_attempt(
        &self,
        quiz_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        attempts::start_attempt(self, quiz_id, request).await
    }

    pub async fn submit_attempt(
        &self,
        attempt_id: i64,
        body: SubmitAttemptRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        attempts::submit_attempt(self, attempt_id, body, request).await
    }

    pub async fn list_my_attempts(
        &self,
        quiz_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        attempts::list_my_attempts(self, quiz_id, request).await
    }

    pub async fn get_attempt(
        &self,
        attempt_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        attempts::get_attempt_result(self, attempt_id, request).await
    }
}

/// 测验及其所属模块
pub(crate) async fn quiz_with_module(
    storage: &Arc<dyn Storage>,
    quiz_id: i64,
) -> Result<Option<(Quiz, Module)>> {
    let Some(quiz) = storage.get_quiz_by_id(quiz_id).await? else {
        return Ok(None);
    };
    Ok(storage
        .get_module_by_id(quiz.module_id)
        .await?
        .map(|module| (quiz, module)))
}
