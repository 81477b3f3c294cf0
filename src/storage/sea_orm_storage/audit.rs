use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs, Model};
use crate::entity::users::{Column as UserColumn, Entity as Users, Model as UserModel};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    audit::{
        entities::{AuditAction, AuditLog, NewAuditLog},
        requests::{AuditLogQuery, AuditSummaryQuery},
        responses::{AuditLogListResponse, AuditSummaryResponse, AuditUserCount},
    },
    courses::responses::NamedCount,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// 时间范围条件（闭区间）
fn date_range(
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> Condition {
    let mut cond = Condition::all();
    if let Some(start) = start {
        cond = cond.add(Column::CreatedAt.gte(start.timestamp()));
    }
    if let Some(end) = end {
        cond = cond.add(Column::CreatedAt.lte(end.timestamp()));
    }
    cond
}

impl SeaOrmStorage {
    pub async fn record_audit_impl(&self, entry: NewAuditLog) -> Result<AuditLog> {
        let details = serde_json::to_string(&entry.details)
            .map_err(|e| LmsError::serialization(format!("序列化审计详情失败: {e}")))?;

        let model = ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action.to_string()),
            entity_type: Set(entry.entity_type.to_string()),
            entity_id: Set(entry.entity_id),
            details: Set(details),
            ip_address: Set(entry.ip_address),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| LmsError::database_operation(format!("写入审计日志失败: {e}")))?;

        let users = self.audit_users(model.user_id.into_iter().collect()).await?;
        Ok(attach_user(model, &users))
    }

    /// 按条件分页查询，最新的在前
    pub async fn list_audit_logs_impl(&self, query: AuditLogQuery) -> Result<AuditLogListResponse> {
        let (page, size) = PaginationQuery {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        }
        .normalized();

        let mut select = AuditLogs::find().filter(date_range(query.start_date, query.end_date));
        if let Some(user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(action) = query.action {
            select = select.filter(Column::Action.eq(action.as_str()));
        }
        if let Some(ref entity_type) = query.entity_type {
            select = select.filter(Column::EntityType.eq(entity_type.as_str()));
        }
        if let Some(entity_id) = query.entity_id {
            select = select.filter(Column::EntityId.eq(entity_id));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询审计日志总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询审计日志页数失败: {e}")))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询审计日志失败: {e}")))?;

        let users = self
            .audit_users(models.iter().filter_map(|m| m.user_id).collect())
            .await?;

        Ok(AuditLogListResponse {
            items: models.into_iter().map(|m| attach_user(m, &users)).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    pub async fn get_audit_log_impl(&self, id: i64) -> Result<Option<AuditLog>> {
        let model = AuditLogs::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询审计日志失败: {e}")))?;

        let Some(model) = model else {
            return Ok(None);
        };
        let users = self.audit_users(model.user_id.into_iter().collect()).await?;
        Ok(Some(attach_user(model, &users)))
    }

    pub async fn audit_summary_impl(
        &self,
        query: AuditSummaryQuery,
    ) -> Result<AuditSummaryResponse> {
        let in_range = || AuditLogs::find().filter(date_range(query.start_date, query.end_date));

        let total_count = in_range()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计审计日志失败: {e}")))?;

        let action_counts: HashMap<String, i64> = in_range()
            .select_only()
            .column(Column::Action)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Action)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按动作统计审计日志失败: {e}")))?
            .into_iter()
            .collect();
        let by_action = AuditAction::all()
            .iter()
            .map(|action| NamedCount {
                name: action.to_string(),
                count: action_counts.get(action.as_str()).copied().unwrap_or(0),
            })
            .collect();

        let by_entity_type = in_range()
            .select_only()
            .column(Column::EntityType)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::EntityType)
            .order_by_asc(Column::EntityType)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按实体统计审计日志失败: {e}")))?
            .into_iter()
            .map(|(name, count)| NamedCount { name, count })
            .collect();

        let user_counts: Vec<(i64, i64)> = in_range()
            .filter(Column::UserId.is_not_null())
            .select_only()
            .column(Column::UserId)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按用户统计审计日志失败: {e}")))?;
        let users = self
            .audit_users(user_counts.iter().map(|(id, _)| *id).collect())
            .await?;
        let mut by_user: Vec<AuditUserCount> = user_counts
            .into_iter()
            .map(|(user_id, count)| AuditUserCount {
                user_id,
                user_name: users
                    .get(&user_id)
                    .map(|u| format!("{} {}", u.first_name, u.last_name)),
                count,
            })
            .collect();
        by_user.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));

        Ok(AuditSummaryResponse {
            total_count: total_count as i64,
            by_action,
            by_entity_type,
            by_user,
        })
    }

    /// 批量查询操作者，包含已软删除的用户
    async fn audit_users(&self, mut ids: Vec<i64>) -> Result<HashMap<i64, UserModel>> {
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = Users::find()
            .filter(UserColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询操作者失败: {e}")))?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

fn attach_user(model: Model, users: &HashMap<i64, UserModel>) -> AuditLog {
    let user = model.user_id.and_then(|id| users.get(&id));
    model.into_audit_log(user)
}
