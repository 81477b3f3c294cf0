//! 数据模型定义
//!
//! 每个业务域拆分为 entities / requests / responses 三部分，
//! 并通过 ts-rs 导出 TypeScript 类型。

pub mod audit;
pub mod auth;
pub mod categories;
pub mod common;
pub mod courses;
pub mod departments;
pub mod enrollments;
pub mod files;
pub mod modules;
pub mod quizzes;
pub mod rbac;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

use serde::{Deserialize, Serialize};

/// 程序启动时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 业务错误码
///
/// 0 表示成功，1xxx 为通用错误，2xxx 起按业务域划分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    RateLimitExceeded = 1006,
    PayloadTooLarge = 1007,
    InternalServerError = 1500,

    // 认证
    AuthFailed = 2000,
    UserInactive = 2001,
    InvalidToken = 2002,
    PasswordPolicyViolation = 2003,
    RegisterFailed = 2004,

    // 用户
    UserNotFound = 3000,
    UserNameInvalid = 3001,
    UserEmailInvalid = 3002,
    UserNameAlreadyExists = 3003,
    UserEmailAlreadyExists = 3004,
    CanNotDeleteCurrentUser = 3005,
    DepartmentNotFound = 3100,
    DepartmentAlreadyExists = 3101,
    RoleNotFound = 3200,

    // 课程
    CategoryNotFound = 4000,
    CategoryAlreadyExists = 4001,
    CategoryInUse = 4002,
    CourseNotFound = 4100,
    CourseAlreadyPublished = 4101,
    CourseHasNoModules = 4102,
    CourseHasEnrollments = 4103,
    CourseNotPublished = 4104,
    ModuleNotFound = 4200,
    DocumentNotFound = 4201,
    VideoNotFound = 4202,
    DocumentNotDownloadable = 4203,
    ModuleHasAttempts = 4204,

    // 选课与进度
    AlreadyEnrolled = 5000,
    NotEnrolled = 5001,
    EnrollmentNotFound = 5002,

    // 测验
    QuizNotFound = 6000,
    QuestionNotFound = 6001,
    QuizHasAttempts = 6002,
    MaxAttemptsReached = 6003,
    AttemptNotFound = 6004,
    AttemptAlreadySubmitted = 6005,
    TimeLimitExceeded = 6006,

    // 文件
    FileNotFound = 7000,
    FileTypeNotAllowed = 7001,
    FileSizeExceeded = 7002,
    FileUploadFailed = 7003,
    MultifileUploadNotAllowed = 7004,

    // 审计
    AuditLogNotFound = 8000,
}
