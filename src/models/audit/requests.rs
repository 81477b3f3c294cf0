use serde::Deserialize;
use ts_rs::TS;

use super::entities::AuditAction;

// 审计日志查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditLogQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

// 审计汇总的时间范围
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/audit.ts")]
pub struct AuditSummaryQuery {
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl AuditSummaryQuery {
    pub fn validate(&self) -> Result<(), String> {
        validate_range(self.start_date, self.end_date)
    }
}

impl AuditLogQuery {
    pub fn validate(&self) -> Result<(), String> {
        validate_range(self.start_date, self.end_date)
    }
}

fn validate_range(
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err("start_date must not be later than end_date".to_string())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parses_action_and_dates() {
        let query: AuditLogQuery = serde_json::from_value(serde_json::json!({
            "action": "DELETE",
            "start_date": "2025-02-01T00:00:00Z",
            "end_date": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(query.action, Some(AuditAction::Delete));
        assert!(query.validate().is_err());

        assert!(AuditSummaryQuery::default().validate().is_ok());
    }
}
