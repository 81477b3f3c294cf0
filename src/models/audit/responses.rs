use serde::Serialize;
use ts_rs::TS;

use super::entities::AuditLog;
use crate::models::PaginationInfo;
use crate::models::courses::responses::NamedCount;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLog>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditUserCount {
    pub user_id: i64,
    pub user_name: Option<String>,
    pub count: i64,
}

// 审计汇总，按动作列出全部取值（含 0）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditSummaryResponse {
    pub total_count: i64,
    pub by_action: Vec<NamedCount>,
    pub by_entity_type: Vec<NamedCount>,
    pub by_user: Vec<AuditUserCount>,
}
