//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod audit_logs;
pub mod categories;
pub mod courses;
pub mod departments;
pub mod documents;
pub mod enrollments;
pub mod module_progress;
pub mod modules;
pub mod question_options;
pub mod questions;
pub mod quiz_attempts;
pub mod quiz_responses;
pub mod quizzes;
pub mod roles;
pub mod users;
pub mod videos;

use chrono::{DateTime, Utc};

/// Unix 秒转为 UTC 时间
pub(crate) fn ts_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

pub(crate) fn opt_ts_to_datetime(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.map(ts_to_datetime)
}
