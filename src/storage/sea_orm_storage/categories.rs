use super::SeaOrmStorage;
use crate::entity::categories::{ActiveModel, Column, Entity as Categories};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::errors::{LmsError, Result};
use crate::models::categories::{
    entities::Category,
    requests::{CreateCategoryRequest, UpdateCategoryRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    pub async fn list_categories_impl(&self) -> Result<Vec<Category>> {
        let models = Categories::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询分类列表失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_category()).collect())
    }

    pub async fn get_category_by_id_impl(&self, id: i64) -> Result<Option<Category>> {
        let result = Categories::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询分类失败: {e}")))?;

        Ok(result.map(|m| m.into_category()))
    }

    pub async fn get_category_by_name_impl(&self, name: &str) -> Result<Option<Category>> {
        let result = Categories::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询分类失败: {e}")))?;

        Ok(result.map(|m| m.into_category()))
    }

    pub async fn create_category_impl(&self, req: CreateCategoryRequest) -> Result<Category> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            parent_id: Set(req.parent_id),
            color_code: Set(req.color_code),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建分类失败: {e}")))?;

        Ok(result.into_category())
    }

    pub async fn update_category_impl(
        &self,
        id: i64,
        update: UpdateCategoryRequest,
    ) -> Result<Option<Category>> {
        if self.get_category_by_id_impl(id).await?.is_none() {
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
        if let Some(parent_id) = update.parent_id {
            model.parent_id = Set(Some(parent_id));
        }
        if let Some(color_code) = update.color_code {
            model.color_code = Set(Some(color_code));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新分类失败: {e}")))?;

        self.get_category_by_id_impl(id).await
    }

    pub async fn delete_category_impl(&self, id: i64) -> Result<bool> {
        let result = Categories::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除分类失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_courses_in_category_impl(&self, category_id: i64) -> Result<u64> {
        Courses::find()
            .filter(CourseColumn::CategoryId.eq(category_id))
            .filter(CourseColumn::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计分类课程失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, parent_id: Option<i64>) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            description: None,
            parent_id,
            color_code: Some("#336699".to_string()),
        }
    }

    #[tokio::test]
    async fn test_category_crud() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let root = storage.create_category_impl(request("Compliance", None)).await.unwrap();
        let child = storage
            .create_category_impl(request("Privacy", Some(root.id)))
            .await
            .unwrap();
        assert_eq!(child.parent_id, Some(root.id));

        let found = storage.get_category_by_name_impl("Privacy").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(child.id));

        let updated = storage
            .update_category_impl(
                child.id,
                UpdateCategoryRequest {
                    name: Some("Data Privacy".into()),
                    description: None,
                    parent_id: None,
                    color_code: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Data Privacy");
        assert_eq!(updated.color_code.as_deref(), Some("#336699"));

        assert_eq!(storage.list_categories_impl().await.unwrap().len(), 2);
        assert!(storage.delete_category_impl(child.id).await.unwrap());
        assert_eq!(storage.count_courses_in_category_impl(root.id).await.unwrap(), 0);
    }
}
