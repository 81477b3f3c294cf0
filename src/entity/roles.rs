//! 角色实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 未知角色名返回 None
    pub fn into_role(self) -> Option<crate::models::rbac::entities::Role> {
        use crate::models::rbac::entities::Role;
        use crate::models::users::entities::UserRole;

        let name = self.name.parse::<UserRole>().ok()?;
        Some(Role {
            id: self.id,
            permissions: name.permissions().to_vec(),
            name,
            display_name: self.display_name,
            description: self.description,
            created_at: super::ts_to_datetime(self.created_at),
        })
    }
}
