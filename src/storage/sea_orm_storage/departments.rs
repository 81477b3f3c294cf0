use super::SeaOrmStorage;
use crate::entity::departments::{ActiveModel, Column, Entity as Departments};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{LmsError, Result};
use crate::models::departments::{
    entities::Department,
    requests::{CreateDepartmentRequest, UpdateDepartmentRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};

impl SeaOrmStorage {
    pub async fn list_departments_impl(&self) -> Result<Vec<Department>> {
        let models = Departments::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询部门列表失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_department()).collect())
    }

    pub async fn get_department_by_id_impl(&self, id: i64) -> Result<Option<Department>> {
        let result = Departments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询部门失败: {e}")))?;

        Ok(result.map(|m| m.into_department()))
    }

    pub async fn get_department_by_name_impl(&self, name: &str) -> Result<Option<Department>> {
        let result = Departments::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询部门失败: {e}")))?;

        Ok(result.map(|m| m.into_department()))
    }

    pub async fn create_department_impl(&self, req: CreateDepartmentRequest) -> Result<Department> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建部门失败: {e}")))?;

        Ok(result.into_department())
    }

    pub async fn update_department_impl(
        &self,
        id: i64,
        update: UpdateDepartmentRequest,
    ) -> Result<Option<Department>> {
        if self.get_department_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新部门失败: {e}")))?;

        self.get_department_by_id_impl(id).await
    }

    /// 删除部门，先解除用户关联
    pub async fn delete_department_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        Users::update_many()
            .col_expr(UserColumn::DepartmentId, Expr::value(Option::<i64>::None))
            .filter(UserColumn::DepartmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("解除部门用户失败: {e}")))?;

        let result = Departments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除部门失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};

    #[tokio::test]
    async fn test_delete_department_detaches_users() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let dept = storage
            .create_department_impl(CreateDepartmentRequest {
                name: " Engineering ".into(),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(dept.name, "Engineering");

        let user = storage
            .create_user_impl(
                CreateUserRequest {
                    username: "eve".into(),
                    email: "eve@example.com".into(),
                    password: "hashed".into(),
                    first_name: "Eve".into(),
                    last_name: "Smith".into(),
                    phone: None,
                    role: UserRole::Employee,
                    department_id: Some(dept.id),
                    is_active: true,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(user.department_id, Some(dept.id));

        assert!(storage.delete_department_impl(dept.id).await.unwrap());
        let user = storage.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert_eq!(user.department_id, None);
        assert!(storage.get_department_by_id_impl(dept.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_department() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let result = storage
            .update_department_impl(
                42,
                UpdateDepartmentRequest {
                    name: Some("x".into()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
