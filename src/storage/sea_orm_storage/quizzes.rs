use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::question_options::{
    ActiveModel as OptionActiveModel, Column as OptionColumn, Entity as QuestionOptions,
};
use crate::entity::questions::{
    ActiveModel as QuestionActiveModel, Column as QuestionColumn, Entity as Questions,
};
use crate::entity::quiz_attempts::{
    ActiveModel as AttemptActiveModel, Column as AttemptColumn, Entity as QuizAttempts,
};
use crate::entity::quiz_responses::{
    ActiveModel as ResponseActiveModel, Column as ResponseColumn, Entity as QuizResponses,
};
use crate::entity::quizzes::{ActiveModel, Column, Entity as Quizzes};
use crate::errors::{LmsError, Result};
use crate::models::quizzes::{
    entities::{AttemptOutcome, Question, QuestionOption, Quiz, QuizAttempt, QuizResponse},
    requests::{
        CreateOptionRequest, CreateQuestionRequest, CreateQuizRequest, UpdateQuestionRequest,
        UpdateQuizRequest,
    },
    responses::QuizSummary,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 插入题目及其选项
    async fn insert_question<C: ConnectionTrait>(
        conn: &C,
        quiz_id: i64,
        order_index: i32,
        req: CreateQuestionRequest,
    ) -> Result<i64> {
        let question = QuestionActiveModel {
            quiz_id: Set(quiz_id),
            question_text: Set(req.question_text.trim().to_string()),
            question_type: Set(req.question_type.to_string()),
            points: Set(req.points),
            order_index: Set(order_index),
            explanation: Set(req.explanation),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| LmsError::database_operation(format!("创建题目失败: {e}")))?;

        Self::insert_options(conn, question.id, req.options).await?;
        Ok(question.id)
    }

    async fn insert_options<C: ConnectionTrait>(
        conn: &C,
        question_id: i64,
        options: Vec<CreateOptionRequest>,
    ) -> Result<()> {
        for (idx, option) in options.into_iter().enumerate() {
            let order_index = if option.order_index == 0 {
                idx as i32 + 1
            } else {
                option.order_index
            };
            OptionActiveModel {
                question_id: Set(question_id),
                option_text: Set(option.option_text.trim().to_string()),
                is_correct: Set(option.is_correct),
                order_index: Set(order_index),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建选项失败: {e}")))?;
        }
        Ok(())
    }

    /// 批量加载选项并组装题目
    async fn assemble_questions(
        &self,
        models: Vec<crate::entity::questions::Model>,
    ) -> Result<Vec<Question>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = models.iter().map(|q| q.id).collect();
        let options = QuestionOptions::find()
            .filter(OptionColumn::QuestionId.is_in(ids))
            .order_by_asc(OptionColumn::OrderIndex)
            .order_by_asc(OptionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选项失败: {e}")))?;

        let mut grouped: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for option in options {
            grouped
                .entry(option.question_id)
                .or_default()
                .push(option.into_option());
        }

        Ok(models
            .into_iter()
            .map(|q| {
                let options = grouped.remove(&q.id).unwrap_or_default();
                q.into_question(options)
            })
            .collect())
    }

    // ==================== 测验 ====================

    pub async fn list_quiz_summaries_impl(&self, module_id: i64) -> Result<Vec<QuizSummary>> {
        let quizzes = Quizzes::find()
            .filter(Column::ModuleId.eq(module_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询测验列表失败: {e}")))?;

        let mut summaries = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let points: Vec<f64> = Questions::find()
                .select_only()
                .column(QuestionColumn::Points)
                .filter(QuestionColumn::QuizId.eq(quiz.id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询题目失败: {e}")))?;

            summaries.push(QuizSummary {
                total_questions: points.len() as i64,
                total_points: points.iter().sum(),
                quiz: quiz.into_quiz(),
            });
        }

        Ok(summaries)
    }

    pub async fn get_quiz_by_id_impl(&self, id: i64) -> Result<Option<Quiz>> {
        let result = Quizzes::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询测验失败: {e}")))?;

        Ok(result.map(|m| m.into_quiz()))
    }

    pub async fn list_questions_impl(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let models = Questions::find()
            .filter(QuestionColumn::QuizId.eq(quiz_id))
            .order_by_asc(QuestionColumn::OrderIndex)
            .order_by_asc(QuestionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询题目失败: {e}")))?;

        self.assemble_questions(models).await
    }

    /// 创建测验及其题目
    pub async fn create_quiz_impl(&self, module_id: i64, req: CreateQuizRequest) -> Result<Quiz> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let quiz = ActiveModel {
            module_id: Set(module_id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            time_limit: Set(req.time_limit),
            max_attempts: Set(req.max_attempts),
            passing_score: Set(req.passing_score),
            randomize_questions: Set(req.randomize_questions),
            show_results_immediately: Set(req.show_results_immediately),
            allow_review: Set(req.allow_review),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| LmsError::database_operation(format!("创建测验失败: {e}")))?;

        for (idx, question) in req.questions.into_iter().enumerate() {
            let order_index = if question.order_index == 0 {
                idx as i32 + 1
            } else {
                question.order_index
            };
            Self::insert_question(&txn, quiz.id, order_index, question).await?;
        }

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(quiz.into_quiz())
    }

    pub async fn update_quiz_impl(
        &self,
        id: i64,
        update: UpdateQuizRequest,
    ) -> Result<Option<Quiz>> {
        if self.get_quiz_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(time_limit) = update.time_limit {
            model.time_limit = Set(time_limit);
        }
        if let Some(max_attempts) = update.max_attempts {
            model.max_attempts = Set(max_attempts);
        }
        if let Some(passing_score) = update.passing_score {
            model.passing_score = Set(passing_score);
        }
        if let Some(randomize) = update.randomize_questions {
            model.randomize_questions = Set(randomize);
        }
        if let Some(show) = update.show_results_immediately {
            model.show_results_immediately = Set(show);
        }
        if let Some(allow_review) = update.allow_review {
            model.allow_review = Set(allow_review);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新测验失败: {e}")))?;

        self.get_quiz_by_id_impl(id).await
    }

    pub async fn delete_quiz_impl(&self, id: i64) -> Result<bool> {
        let result = Quizzes::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除测验失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_quiz_attempts_impl(&self, quiz_id: i64) -> Result<u64> {
        QuizAttempts::find()
            .filter(AttemptColumn::QuizId.eq(quiz_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计作答次数失败: {e}")))
    }

    pub async fn count_module_quiz_attempts_impl(&self, module_id: i64) -> Result<u64> {
        QuizAttempts::find()
            .inner_join(Quizzes)
            .filter(Column::ModuleId.eq(module_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计模块作答次数失败: {e}")))
    }

    // ==================== 题目 ====================

    pub async fn get_question_by_id_impl(&self, id: i64) -> Result<Option<Question>> {
        let model = Questions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询题目失败: {e}")))?;

        match model {
            Some(model) => Ok(self.assemble_questions(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// 添加题目，order_index 为 0 时排到末尾
    pub async fn create_question_impl(
        &self,
        quiz_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let order_index = if req.order_index == 0 {
            let max: Option<Option<i32>> = Questions::find()
                .select_only()
                .column_as(QuestionColumn::OrderIndex.max(), "max_order")
                .filter(QuestionColumn::QuizId.eq(quiz_id))
                .into_tuple()
                .one(&txn)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询题目顺序失败: {e}")))?;
            max.flatten().unwrap_or(0) + 1
        } else {
            req.order_index
        };

        let id = Self::insert_question(&txn, quiz_id, order_index, req).await?;

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_question_by_id_impl(id)
            .await?
            .ok_or_else(|| LmsError::not_found("Question not found"))
    }

    /// 更新题目，提供选项时整体替换
    pub async fn update_question_impl(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>> {
        if self.get_question_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let mut model = QuestionActiveModel {
            id: Set(id),
            ..Default::default()
        };
        let mut changed = false;

        if let Some(text) = update.question_text {
            model.question_text = Set(text.trim().to_string());
            changed = true;
        }
        if let Some(points) = update.points {
            model.points = Set(points);
            changed = true;
        }
        if let Some(order_index) = update.order_index {
            model.order_index = Set(order_index);
            changed = true;
        }
        if let Some(explanation) = update.explanation {
            model.explanation = Set(Some(explanation));
            changed = true;
        }

        if changed {
            model
                .update(&txn)
                .await
                .map_err(|e| LmsError::database_operation(format!("更新题目失败: {e}")))?;
        }

        if let Some(options) = update.options {
            QuestionOptions::delete_many()
                .filter(OptionColumn::QuestionId.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| LmsError::database_operation(format!("删除旧选项失败: {e}")))?;
            Self::insert_options(&txn, id, options).await?;
        }

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_question_by_id_impl(id).await
    }

    pub async fn delete_question_impl(&self, id: i64) -> Result<bool> {
        let result = Questions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除题目失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    // ==================== 作答 ====================

    pub async fn list_user_attempts_impl(
        &self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Vec<QuizAttempt>> {
        let models = QuizAttempts::find()
            .filter(AttemptColumn::QuizId.eq(quiz_id))
            .filter(AttemptColumn::UserId.eq(user_id))
            .order_by_asc(AttemptColumn::AttemptNumber)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作答记录失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_attempt()).collect())
    }

    pub async fn get_attempt_by_id_impl(&self, id: i64) -> Result<Option<QuizAttempt>> {
        let result = QuizAttempts::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作答记录失败: {e}")))?;

        Ok(result.map(|m| m.into_attempt()))
    }

    pub async fn create_attempt_impl(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
        total_points: f64,
    ) -> Result<QuizAttempt> {
        let model = AttemptActiveModel {
            quiz_id: Set(quiz_id),
            user_id: Set(user_id),
            attempt_number: Set(attempt_number),
            score: Set(None),
            total_points: Set(total_points),
            earned_points: Set(0.0),
            is_passed: Set(false),
            started_at: Set(chrono::Utc::now().timestamp()),
            completed_at: Set(None),
            time_spent: Set(0),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建作答记录失败: {e}")))?;

        Ok(result.into_attempt())
    }

    /// 写入评分结果，只对未完成的作答生效
    pub async fn finalize_attempt_impl(
        &self,
        attempt_id: i64,
        outcome: AttemptOutcome,
        time_spent: i64,
    ) -> Result<QuizAttempt> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let result = QuizAttempts::update_many()
            .col_expr(AttemptColumn::Score, Expr::value(outcome.score))
            .col_expr(AttemptColumn::TotalPoints, Expr::value(outcome.total_points))
            .col_expr(AttemptColumn::EarnedPoints, Expr::value(outcome.earned_points))
            .col_expr(AttemptColumn::IsPassed, Expr::value(outcome.is_passed))
            .col_expr(AttemptColumn::CompletedAt, Expr::value(now))
            .col_expr(AttemptColumn::TimeSpent, Expr::value(time_spent.max(0)))
            .filter(AttemptColumn::Id.eq(attempt_id))
            .filter(AttemptColumn::CompletedAt.is_null())
            .exec(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新作答记录失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(LmsError::business_rule("Attempt already submitted"));
        }

        for response in outcome.responses {
            ResponseActiveModel {
                attempt_id: Set(attempt_id),
                question_id: Set(response.question_id),
                question_option_id: Set(response.question_option_id),
                text_response: Set(response.text_response),
                is_correct: Set(response.is_correct),
                points_earned: Set(response.points_earned),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("保存作答失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_attempt_by_id_impl(attempt_id)
            .await?
            .ok_or_else(|| LmsError::not_found("Attempt not found"))
    }

    pub async fn list_attempt_responses_impl(&self, attempt_id: i64) -> Result<Vec<QuizResponse>> {
        let models = QuizResponses::find()
            .filter(ResponseColumn::AttemptId.eq(attempt_id))
            .order_by_asc(ResponseColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作答明细失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_response()).collect())
    }
}
