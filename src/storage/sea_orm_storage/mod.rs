//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit;
mod categories;
mod courses;
mod departments;
mod enrollments;
mod modules;
mod quizzes;
mod roles;
mod users;

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// 是否为唯一约束冲突（并发插入同一条记录）
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LmsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 内存 SQLite，供测试使用
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("内存数据库连接失败: {e}")))?;
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LmsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::{Storage, UserLearningStats};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(
        &self,
        user: CreateUserRequest,
        verification_token: Option<String>,
    ) -> Result<User> {
        self.create_user_impl(user, verification_token).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn soft_delete_user(&self, id: i64) -> Result<bool> {
        self.soft_delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        self.update_password_impl(id, password_hash).await
    }

    async fn set_reset_token(&self, id: i64, token: &str, expires_at: i64) -> Result<bool> {
        self.set_reset_token_impl(id, token, expires_at).await
    }

    async fn get_user_by_reset_token(&self, token: &str, now: i64) -> Result<Option<User>> {
        self.get_user_by_reset_token_impl(token, now).await
    }

    async fn verify_email(&self, id: i64, token: &str) -> Result<bool> {
        self.verify_email_impl(id, token).await
    }

    async fn get_user_stats(&self) -> Result<UserStatsResponse> {
        self.get_user_stats_impl().await
    }

    async fn get_user_learning_stats(&self, id: i64) -> Result<UserLearningStats> {
        self.get_user_learning_stats_impl(id).await
    }

    // 角色模块
    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.list_roles_impl().await
    }

    // 部门模块
    async fn list_departments(&self) -> Result<Vec<Department>> {
        self.list_departments_impl().await
    }

    async fn get_department_by_id(&self, id: i64) -> Result<Option<Department>> {
        self.get_department_by_id_impl(id).await
    }

    async fn get_department_by_name(&self, name: &str) -> Result<Option<Department>> {
        self.get_department_by_name_impl(name).await
    }

    async fn create_department(&self, req: CreateDepartmentRequest) -> Result<Department> {
        self.create_department_impl(req).await
    }

    async fn update_department(
        &self,
        id: i64,
        update: UpdateDepartmentRequest,
    ) -> Result<Option<Department>> {
        self.update_department_impl(id, update).await
    }

    async fn delete_department(&self, id: i64) -> Result<bool> {
        self.delete_department_impl(id).await
    }

    // 分类模块
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list_categories_impl().await
    }

    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        self.get_category_by_id_impl(id).await
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.get_category_by_name_impl(name).await
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category> {
        self.create_category_impl(req).await
    }

    async fn update_category(
        &self,
        id: i64,
        update: UpdateCategoryRequest,
    ) -> Result<Option<Category>> {
        self.update_category_impl(id, update).await
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        self.delete_category_impl(id).await
    }

    async fn count_courses_in_category(&self, category_id: i64) -> Result<u64> {
        self.count_courses_in_category_impl(category_id).await
    }

    // 课程模块
    async fn create_course(&self, req: CreateCourseRequest, creator_id: i64) -> Result<Course> {
        self.create_course_impl(req, creator_id).await
    }

    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(id).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(id, update).await
    }

    async fn soft_delete_course(&self, id: i64) -> Result<bool> {
        self.soft_delete_course_impl(id).await
    }

    async fn set_course_status(&self, id: i64, status: CourseStatus) -> Result<Option<Course>> {
        self.set_course_status_impl(id, status).await
    }

    async fn count_existing_courses(&self, ids: &[i64]) -> Result<u64> {
        self.count_existing_courses_impl(ids).await
    }

    async fn get_course_stats(&self) -> Result<CourseStatsResponse> {
        self.get_course_stats_impl().await
    }

    // 模块与内容
    async fn list_modules(&self, course_id: i64) -> Result<Vec<Module>> {
        self.list_modules_impl(course_id).await
    }

    async fn count_modules(&self, course_id: i64) -> Result<u64> {
        self.count_modules_impl(course_id).await
    }

    async fn get_module_by_id(&self, id: i64) -> Result<Option<Module>> {
        self.get_module_by_id_impl(id).await
    }

    async fn create_module(&self, course_id: i64, req: CreateModuleRequest) -> Result<Module> {
        self.create_module_impl(course_id, req).await
    }

    async fn update_module(
        &self,
        id: i64,
        update: UpdateModuleRequest,
    ) -> Result<Option<Module>> {
        self.update_module_impl(id, update).await
    }

    async fn delete_module(&self, id: i64) -> Result<bool> {
        self.delete_module_impl(id).await
    }

    async fn reorder_modules(&self, course_id: i64, module_ids: &[i64]) -> Result<Vec<Module>> {
        self.reorder_modules_impl(course_id, module_ids).await
    }

    async fn list_documents(&self, module_id: i64) -> Result<Vec<Document>> {
        self.list_documents_impl(module_id).await
    }

    async fn get_document_by_id(&self, id: i64) -> Result<Option<Document>> {
        self.get_document_by_id_impl(id).await
    }

    async fn create_document(
        &self,
        module_id: i64,
        req: CreateDocumentRequest,
    ) -> Result<Document> {
        self.create_document_impl(module_id, req).await
    }

    async fn delete_document(&self, id: i64) -> Result<bool> {
        self.delete_document_impl(id).await
    }

    async fn increment_download_count(&self, id: i64) -> Result<bool> {
        self.increment_download_count_impl(id).await
    }

    async fn list_videos(&self, module_id: i64) -> Result<Vec<Video>> {
        self.list_videos_impl(module_id).await
    }

    async fn get_video_by_id(&self, id: i64) -> Result<Option<Video>> {
        self.get_video_by_id_impl(id).await
    }

    async fn create_video(&self, module_id: i64, req: CreateVideoRequest) -> Result<Video> {
        self.create_video_impl(module_id, req).await
    }

    async fn update_video(&self, id: i64, update: UpdateVideoRequest) -> Result<Option<Video>> {
        self.update_video_impl(id, update).await
    }

    async fn delete_video(&self, id: i64) -> Result<bool> {
        self.delete_video_impl(id).await
    }

    // 测验模块
    async fn list_quiz_summaries(&self, module_id: i64) -> Result<Vec<QuizSummary>> {
        self.list_quiz_summaries_impl(module_id).await
    }

    async fn get_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>> {
        self.get_quiz_by_id_impl(id).await
    }

    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        self.list_questions_impl(quiz_id).await
    }

    async fn create_quiz(&self, module_id: i64, req: CreateQuizRequest) -> Result<Quiz> {
        self.create_quiz_impl(module_id, req).await
    }

    async fn update_quiz(&self, id: i64, update: UpdateQuizRequest) -> Result<Option<Quiz>> {
        self.update_quiz_impl(id, update).await
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool> {
        self.delete_quiz_impl(id).await
    }

    async fn count_quiz_attempts(&self, quiz_id: i64) -> Result<u64> {
        self.count_quiz_attempts_impl(quiz_id).await
    }

    async fn count_module_quiz_attempts(&self, module_id: i64) -> Result<u64> {
        self.count_module_quiz_attempts_impl(module_id).await
    }

    async fn get_question_by_id(&self, id: i64) -> Result<Option<Question>> {
        self.get_question_by_id_impl(id).await
    }

    async fn create_question(&self, quiz_id: i64, req: CreateQuestionRequest) -> Result<Question> {
        self.create_question_impl(quiz_id, req).await
    }

    async fn update_question(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>> {
        self.update_question_impl(id, update).await
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        self.delete_question_impl(id).await
    }

    async fn list_user_attempts(&self, quiz_id: i64, user_id: i64) -> Result<Vec<QuizAttempt>> {
        self.list_user_attempts_impl(quiz_id, user_id).await
    }

    async fn get_attempt_by_id(&self, id: i64) -> Result<Option<QuizAttempt>> {
        self.get_attempt_by_id_impl(id).await
    }

    async fn create_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
        total_points: f64,
    ) -> Result<QuizAttempt> {
        self.create_attempt_impl(quiz_id, user_id, attempt_number, total_points)
            .await
    }

    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        outcome: AttemptOutcome,
        time_spent: i64,
    ) -> Result<QuizAttempt> {
        self.finalize_attempt_impl(attempt_id, outcome, time_spent)
            .await
    }

    async fn list_attempt_responses(&self, attempt_id: i64) -> Result<Vec<QuizResponse>> {
        self.list_attempt_responses_impl(attempt_id).await
    }

    // 选课与进度
    async fn get_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        self.get_enrollment_impl(user_id, course_id).await
    }

    async fn create_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
        due_date: Option<i64>,
        assigned_by: Option<i64>,
    ) -> Result<Enrollment> {
        self.create_enrollment_impl(user_id, course_id, due_date, assigned_by)
            .await
    }

    async fn list_course_enrollments(
        &self,
        course_id: i64,
        query: PaginationQuery,
    ) -> Result<CourseEnrollmentListResponse> {
        self.list_course_enrollments_impl(course_id, query).await
    }

    async fn count_course_enrollments(&self, course_id: i64) -> Result<u64> {
        self.count_course_enrollments_impl(course_id).await
    }

    async fn list_user_enrollments(&self, user_id: i64) -> Result<Vec<(Enrollment, String)>> {
        self.list_user_enrollments_impl(user_id).await
    }

    async fn drop_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        self.drop_enrollment_impl(user_id, course_id).await
    }

    async fn mark_module_complete(&self, user_id: i64, module_id: i64) -> Result<bool> {
        self.mark_module_complete_impl(user_id, module_id).await
    }

    async fn list_module_progress(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Vec<ModuleProgress>> {
        self.list_module_progress_impl(user_id, course_id).await
    }

    async fn recompute_enrollment_progress(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        self.recompute_enrollment_progress_impl(user_id, course_id)
            .await
    }

    // 审计日志
    async fn record_audit(&self, entry: NewAuditLog) -> Result<AuditLog> {
        self.record_audit_impl(entry).await
    }

    async fn list_audit_logs(&self, query: AuditLogQuery) -> Result<AuditLogListResponse> {
        self.list_audit_logs_impl(query).await
    }

    async fn get_audit_log(&self, id: i64) -> Result<Option<AuditLog>> {
        self.get_audit_log_impl(id).await
    }

    async fn audit_summary(&self, query: AuditSummaryQuery) -> Result<AuditSummaryResponse> {
        self.audit_summary_impl(query).await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! 存储层测试数据
    use super::SeaOrmStorage;
    use crate::models::{
        courses::{entities::Course, requests::CreateCourseRequest},
        modules::{
            entities::{ContentType, Module},
            requests::CreateModuleRequest,
        },
        users::{
            entities::{User, UserRole},
            requests::CreateUserRequest,
        },
    };

    /// 测试用户的明文密码
    pub const PASSWORD: &str = "Passw0rd!";

    pub async fn seed_user(storage: &SeaOrmStorage, username: &str, role: UserRole) -> User {
        let password_hash = crate::utils::password::hash_password(PASSWORD).unwrap();
        storage
            .create_user_impl(
                CreateUserRequest {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password: password_hash,
                    first_name: "Test".to_string(),
                    last_name: username.to_string(),
                    phone: None,
                    role,
                    department_id: None,
                    is_active: true,
                },
                None,
            )
            .await
            .unwrap()
    }

    pub fn course_request(title: &str) -> CreateCourseRequest {
        serde_json::from_value(serde_json::json!({ "title": title })).unwrap()
    }

    pub async fn seed_course(storage: &SeaOrmStorage, creator_id: i64, title: &str) -> Course {
        storage
            .create_course_impl(course_request(title), creator_id)
            .await
            .unwrap()
    }

    pub async fn seed_module(storage: &SeaOrmStorage, course_id: i64, title: &str) -> Module {
        storage
            .create_module_impl(
                course_id,
                CreateModuleRequest {
                    title: title.to_string(),
                    description: None,
                    content_type: ContentType::Document,
                    content_url: None,
                    content_data: None,
                    order_index: 0,
                    is_mandatory: true,
                    estimated_duration: None,
                },
            )
            .await
            .unwrap()
    }
}
