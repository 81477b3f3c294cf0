use std::sync::Arc;

use crate::models::{
    PaginationQuery,
    audit::{
        entities::{AuditLog, NewAuditLog},
        requests::{AuditLogQuery, AuditSummaryQuery},
        responses::{AuditLogListResponse, AuditSummaryResponse},
    },
    categories::{
        entities::Category,
        requests::{CreateCategoryRequest, UpdateCategoryRequest},
    },
    courses::{
        entities::{Course, CourseStatus},
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::{CourseListResponse, CourseStatsResponse},
    },
    departments::{
        entities::Department,
        requests::{CreateDepartmentRequest, UpdateDepartmentRequest},
    },
    enrollments::{
        entities::{Enrollment, ModuleProgress},
        responses::CourseEnrollmentListResponse,
    },
    modules::{
        entities::{Document, Module, Video},
        requests::{
            CreateDocumentRequest, CreateModuleRequest, CreateVideoRequest, UpdateModuleRequest,
            UpdateVideoRequest,
        },
    },
    quizzes::{
        entities::{AttemptOutcome, Question, Quiz, QuizAttempt, QuizResponse},
        requests::{CreateQuestionRequest, CreateQuizRequest, UpdateQuestionRequest, UpdateQuizRequest},
        responses::QuizSummary,
    },
    rbac::entities::Role,
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::{UserListResponse, UserStatsResponse},
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 用户学习统计：(选课数, 完成课程数, 测验作答次数)
pub type UserLearningStats = (i64, i64, i64);

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户，password 字段为已哈希的密码
    async fn create_user(
        &self,
        user: CreateUserRequest,
        verification_token: Option<String>,
    ) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 软删除用户
    async fn soft_delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 更新密码哈希，同时清除重置令牌
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool>;
    // 保存密码重置令牌
    async fn set_reset_token(&self, id: i64, token: &str, expires_at: i64) -> Result<bool>;
    // 通过未过期的重置令牌获取用户
    async fn get_user_by_reset_token(&self, token: &str, now: i64) -> Result<Option<User>>;
    // 校验邮箱验证令牌并标记已验证
    async fn verify_email(&self, id: i64, token: &str) -> Result<bool>;
    // 用户统计
    async fn get_user_stats(&self) -> Result<UserStatsResponse>;
    // 用户学习统计
    async fn get_user_learning_stats(&self, id: i64) -> Result<UserLearningStats>;

    /// 角色
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// 部门管理方法
    async fn list_departments(&self) -> Result<Vec<Department>>;
    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>>;
    async fn get_department_by_name(&self, name: &str) -> Result<Option<Department>>;
    async fn create_department(&self, req: CreateDepartmentRequest) -> Result<Department>;
    async fn update_department(
        &self,
        id: i64,
        update: UpdateDepartmentRequest,
    ) -> Result<Option<Department>>;
    // 删除部门，所属用户的 department_id 置空
    async fn delete_department(&self, id: i64) -> Result<bool>;

    /// 分类管理方法
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category>;
    async fn update_category(
        &self,
        id: i64,
        update: UpdateCategoryRequest,
    ) -> Result<Option<Category>>;
    async fn delete_category(&self, id: i64) -> Result<bool>;
    // 统计分类下未删除的课程
    async fn count_courses_in_category(&self, category_id: i64) -> Result<u64>;

    /// 课程管理方法
    async fn create_course(&self, req: CreateCourseRequest, creator_id: i64) -> Result<Course>;
    // 获取未删除的课程
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(&self, id: i64, update: UpdateCourseRequest)
    -> Result<Option<Course>>;
    async fn soft_delete_course(&self, id: i64) -> Result<bool>;
    // 更新课程状态，发布时写入 published_at
    async fn set_course_status(&self, id: i64, status: CourseStatus) -> Result<Option<Course>>;
    // 统计给定 ID 中存在（未删除）的课程数
    async fn count_existing_courses(&self, ids: &[i64]) -> Result<u64>;
    async fn get_course_stats(&self) -> Result<CourseStatsResponse>;

    /// 模块管理方法
    async fn list_modules(&self, course_id: i64) -> Result<Vec<Module>>;
    async fn count_modules(&self, course_id: i64) -> Result<u64>;
    async fn get_module_by_id(&self, id: i64) -> Result<Option<Module>>;
    async fn create_module(&self, course_id: i64, req: CreateModuleRequest) -> Result<Module>;
    async fn update_module(&self, id: i64, update: UpdateModuleRequest)
    -> Result<Option<Module>>;
    async fn delete_module(&self, id: i64) -> Result<bool>;
    // 按给定顺序重排模块
    async fn reorder_modules(&self, course_id: i64, module_ids: &[i64]) -> Result<Vec<Module>>;

    /// 文档
    async fn list_documents(&self, module_id: i64) -> Result<Vec<Document>>;
    async fn get_document_by_id(&self, id: i64) -> Result<Option<Document>>;
    async fn create_document(&self, module_id: i64, req: CreateDocumentRequest)
    -> Result<Document>;
    async fn delete_document(&self, id: i64) -> Result<bool>;
    async fn increment_download_count(&self, id: i64) -> Result<bool>;

    /// 视频
    async fn list_videos(&self, module_id: i64) -> Result<Vec<Video>>;
    async fn get_video_by_id(&self, id: i64) -> Result<Option<Video>>;
    async fn create_video(&self, module_id: i64, req: CreateVideoRequest) -> Result<Video>;
    async fn update_video(&self, id: i64, update: UpdateVideoRequest) -> Result<Option<Video>>;
    async fn delete_video(&self, id: i64) -> Result<bool>;

    /// 测验管理方法
    async fn list_quiz_summaries(&self, module_id: i64) -> Result<Vec<QuizSummary>>;
    async fn get_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>>;
    // 按顺序返回题目及其选项
    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>>;
    async fn create_quiz(&self, module_id: i64, req: CreateQuizRequest) -> Result<Quiz>;
    async fn update_quiz(&self, id: i64, update: UpdateQuizRequest) -> Result<Option<Quiz>>;
    async fn delete_quiz(&self, id: i64) -> Result<bool>;
    async fn count_quiz_attempts(&self, quiz_id: i64) -> Result<u64>;
    // 模块下所有测验的作答次数
    async fn count_module_quiz_attempts(&self, module_id: i64) -> Result<u64>;
    async fn get_question_by_id(&self, id: i64) -> Result<Option<Question>>;
    async fn create_question(&self, quiz_id: i64, req: CreateQuestionRequest) -> Result<Question>;
    async fn update_question(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>>;
    async fn delete_question(&self, id: i64) -> Result<bool>;

    /// 测验作答
    async fn list_user_attempts(&self, quiz_id: i64, user_id: i64) -> Result<Vec<QuizAttempt>>;
    async fn get_attempt_by_id(&self, id: i64) -> Result<Option<QuizAttempt>>;
    async fn create_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
        total_points: f64,
    ) -> Result<QuizAttempt>;
    // 写入评分结果并标记完成
    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        outcome: AttemptOutcome,
        time_spent: i64,
    ) -> Result<QuizAttempt>;
    async fn list_attempt_responses(&self, attempt_id: i64) -> Result<Vec<QuizResponse>>;

    /// 选课与进度
    async fn get_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<Enrollment>>;
    // 已选课时返回 BusinessRule，已退课的记录重新激活
    async fn create_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
        due_date: Option<i64>,
        assigned_by: Option<i64>,
    ) -> Result<Enrollment>;
    async fn list_course_enrollments(
        &self,
        course_id: i64,
        query: PaginationQuery,
    ) -> Result<CourseEnrollmentListResponse>;
    async fn count_course_enrollments(&self, course_id: i64) -> Result<u64>;
    // 用户的选课记录及课程标题
    async fn list_user_enrollments(&self, user_id: i64) -> Result<Vec<(Enrollment, String)>>;
    async fn drop_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<Enrollment>>;
    // 标记模块完成，已完成时返回 false
    async fn mark_module_complete(&self, user_id: i64, module_id: i64) -> Result<bool>;
    async fn list_module_progress(&self, user_id: i64, course_id: i64)
    -> Result<Vec<ModuleProgress>>;
    // 按已完成模块重新计算选课进度
    async fn recompute_enrollment_progress(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>>;

    /// 审计日志
    async fn record_audit(&self, entry: NewAuditLog) -> Result<AuditLog>;
    async fn list_audit_logs(&self, query: AuditLogQuery) -> Result<AuditLogListResponse>;
    async fn get_audit_log(&self, id: i64) -> Result<Option<AuditLog>>;
    async fn audit_summary(&self, query: AuditSummaryQuery) -> Result<AuditSummaryResponse>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
