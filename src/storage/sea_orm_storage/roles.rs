use super::SeaOrmStorage;
use crate::entity::roles::{Column, Entity as Roles};
use crate::errors::{LmsError, Result};
use crate::models::rbac::entities::Role;
use sea_orm::{EntityTrait, QueryOrder};

impl SeaOrmStorage {
    /// 列出角色，忽略无法识别的角色名
    pub async fn list_roles_impl(&self) -> Result<Vec<Role>> {
        let models = Roles::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询角色失败: {e}")))?;

        Ok(models.into_iter().filter_map(|m| m.into_role()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::entities::Permission;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_builtin_roles_seeded() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let roles = storage.list_roles_impl().await.unwrap();
        assert_eq!(roles.len(), 4);

        let admin = roles.iter().find(|r| r.name == UserRole::Admin).unwrap();
        assert_eq!(admin.permissions.len(), Permission::all().len());

        let employee = roles.iter().find(|r| r.name == UserRole::Employee).unwrap();
        assert!(employee.permissions.is_empty());
    }
}
