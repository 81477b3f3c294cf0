//! 审计日志实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub details: String, // JSON 对象
    pub ip_address: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转为业务模型，操作者信息由调用方补全
    pub fn into_audit_log(
        self,
        user: Option<&super::users::Model>,
    ) -> crate::models::audit::entities::AuditLog {
        use crate::models::audit::entities::{AuditAction, AuditLog};

        AuditLog {
            id: self.id,
            user_id: self.user_id,
            user_name: user.map(|u| format!("{} {}", u.first_name, u.last_name)),
            user_email: user.map(|u| u.email.clone()),
            action: self.action.parse().unwrap_or(AuditAction::Update),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            details: serde_json::from_str(&self.details).unwrap_or_default(),
            ip_address: self.ip_address,
            created_at: super::ts_to_datetime(self.created_at),
        }
    }
}
