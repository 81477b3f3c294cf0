use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 审计动作
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
    pub enum AuditAction {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
        Login => "LOGIN",
        Logout => "LOGOUT",
    }
}

define_string_enum! {
    // 被审计的实体类型
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
    pub enum AuditEntity {
        User => "user",
        Department => "department",
        Category => "category",
        Course => "course",
        Module => "module",
        Document => "document",
        Video => "video",
        Quiz => "quiz",
        Question => "question",
        Enrollment => "enrollment",
    }
}

// 审计日志
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    /// 操作者全名，用户已不存在时为空
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 待写入的审计记录
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub entity_type: AuditEntity,
    pub entity_id: Option<i64>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
}
