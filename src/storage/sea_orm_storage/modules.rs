use super::SeaOrmStorage;
use crate::entity::documents::{
    ActiveModel as DocumentActiveModel, Column as DocumentColumn, Entity as Documents,
};
use crate::entity::modules::{ActiveModel, Column, Entity as Modules};
use crate::entity::videos::{ActiveModel as VideoActiveModel, Column as VideoColumn, Entity as Videos};
use crate::errors::{LmsError, Result};
use crate::models::modules::{
    entities::{Document, Module, Video},
    requests::{
        CreateDocumentRequest, CreateModuleRequest, CreateVideoRequest, UpdateModuleRequest,
        UpdateVideoRequest,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, ExprTrait},
};

fn json_text(value: Option<serde_json::Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn quality_text(options: &[String]) -> Result<String> {
    serde_json::to_string(options)
        .map_err(|e| LmsError::serialization(format!("序列化清晰度选项失败: {e}")))
}

impl SeaOrmStorage {
    /// 课程下最大的 order_index
    async fn max_module_order<C: ConnectionTrait>(conn: &C, course_id: i64) -> Result<i32> {
        let max: Option<Option<i32>> = Modules::find()
            .select_only()
            .column_as(Column::OrderIndex.max(), "max_order")
            .filter(Column::CourseId.eq(course_id))
            .into_tuple()
            .one(conn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块顺序失败: {e}")))?;

        Ok(max.flatten().unwrap_or(0))
    }

    pub async fn list_modules_impl(&self, course_id: i64) -> Result<Vec<Module>> {
        let models = Modules::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::OrderIndex)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块列表失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_module()).collect())
    }

    pub async fn count_modules_impl(&self, course_id: i64) -> Result<u64> {
        Modules::find()
            .filter(Column::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计模块数量失败: {e}")))
    }

    pub async fn get_module_by_id_impl(&self, id: i64) -> Result<Option<Module>> {
        let result = Modules::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块失败: {e}")))?;

        Ok(result.map(|m| m.into_module()))
    }

    /// 创建模块，order_index 为 0 时排到末尾
    pub async fn create_module_impl(
        &self,
        course_id: i64,
        req: CreateModuleRequest,
    ) -> Result<Module> {
        let now = chrono::Utc::now().timestamp();
        let order_index = if req.order_index == 0 {
            Self::max_module_order(&self.db, course_id).await? + 1
        } else {
            req.order_index
        };

        let model = ActiveModel {
            course_id: Set(course_id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            content_type: Set(req.content_type.to_string()),
            content_url: Set(req.content_url),
            content_data: Set(json_text(req.content_data)),
            order_index: Set(order_index),
            is_mandatory: Set(req.is_mandatory),
            estimated_duration: Set(req.estimated_duration),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建模块失败: {e}")))?;

        // 模块总数变化，已选课学员的进度随之变化
        self.recompute_course_progress_impl(course_id).await?;

        Ok(result.into_module())
    }

    pub async fn update_module_impl(
        &self,
        id: i64,
        update: UpdateModuleRequest,
    ) -> Result<Option<Module>> {
        if self.get_module_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(content_type) = update.content_type {
            model.content_type = Set(content_type.to_string());
        }
        if let Some(content_url) = update.content_url {
            model.content_url = Set(Some(content_url));
        }
        if update.content_data.is_some() {
            model.content_data = Set(json_text(update.content_data));
        }
        if let Some(order_index) = update.order_index {
            model.order_index = Set(order_index);
        }
        if let Some(is_mandatory) = update.is_mandatory {
            model.is_mandatory = Set(is_mandatory);
        }
        if let Some(duration) = update.estimated_duration {
            model.estimated_duration = Set(Some(duration));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新模块失败: {e}")))?;

        self.get_module_by_id_impl(id).await
    }

    pub async fn delete_module_impl(&self, id: i64) -> Result<bool> {
        let Some(module) = self.get_module_by_id_impl(id).await? else {
            return Ok(false);
        };

        let result = Modules::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除模块失败: {e}")))?;

        self.recompute_course_progress_impl(module.course_id).await?;

        Ok(result.rows_affected > 0)
    }

    /// 按列表顺序重写 order_index，列表必须恰好覆盖课程下的全部模块
    pub async fn reorder_modules_impl(
        &self,
        course_id: i64,
        module_ids: &[i64],
    ) -> Result<Vec<Module>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let existing: Vec<i64> = Modules::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块失败: {e}")))?;

        let mut requested = module_ids.to_vec();
        requested.sort_unstable();
        requested.dedup();
        let mut current = existing.clone();
        current.sort_unstable();
        if requested.len() != module_ids.len() || requested != current {
            return Err(LmsError::validation(
                "module_ids must list every module of the course exactly once",
            ));
        }

        let now = chrono::Utc::now().timestamp();
        for (position, module_id) in module_ids.iter().enumerate() {
            Modules::update_many()
                .col_expr(Column::OrderIndex, Expr::value(position as i32 + 1))
                .col_expr(Column::UpdatedAt, Expr::value(now))
                .filter(Column::Id.eq(*module_id))
                .exec(&txn)
                .await
                .map_err(|e| LmsError::database_operation(format!("更新模块顺序失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| LmsError::database_operation(format!("提交事务失败: {e}")))?;

        self.list_modules_impl(course_id).await
    }

    // ==================== 文档 ====================

    pub async fn list_documents_impl(&self, module_id: i64) -> Result<Vec<Document>> {
        let models = Documents::find()
            .filter(DocumentColumn::ModuleId.eq(module_id))
            .order_by_asc(DocumentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询文档列表失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_document()).collect())
    }

    pub async fn get_document_by_id_impl(&self, id: i64) -> Result<Option<Document>> {
        let result = Documents::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询文档失败: {e}")))?;

        Ok(result.map(|m| m.into_document()))
    }

    pub async fn create_document_impl(
        &self,
        module_id: i64,
        req: CreateDocumentRequest,
    ) -> Result<Document> {
        let now = chrono::Utc::now().timestamp();

        let model = DocumentActiveModel {
            module_id: Set(module_id),
            title: Set(req.title.trim().to_string()),
            file_path: Set(req.file_path),
            file_type: Set(req.file_type),
            file_size: Set(req.file_size),
            download_count: Set(0),
            is_downloadable: Set(req.is_downloadable),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建文档失败: {e}")))?;

        Ok(result.into_document())
    }

    pub async fn delete_document_impl(&self, id: i64) -> Result<bool> {
        let result = Documents::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除文档失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn increment_download_count_impl(&self, id: i64) -> Result<bool> {
        let result = Documents::update_many()
            .col_expr(
                DocumentColumn::DownloadCount,
                Expr::col(DocumentColumn::DownloadCount).add(1),
            )
            .filter(DocumentColumn::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新下载次数失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    // ==================== 视频 ====================

    pub async fn list_videos_impl(&self, module_id: i64) -> Result<Vec<Video>> {
        let models = Videos::find()
            .filter(VideoColumn::ModuleId.eq(module_id))
            .order_by_asc(VideoColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询视频列表失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_video()).collect())
    }

    pub async fn get_video_by_id_impl(&self, id: i64) -> Result<Option<Video>> {
        let result = Videos::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询视频失败: {e}")))?;

        Ok(result.map(|m| m.into_video()))
    }

    pub async fn create_video_impl(&self, module_id: i64, req: CreateVideoRequest) -> Result<Video> {
        let now = chrono::Utc::now().timestamp();

        let model = VideoActiveModel {
            module_id: Set(module_id),
            title: Set(req.title.trim().to_string()),
            video_url: Set(req.video_url),
            duration: Set(req.duration),
            thumbnail_url: Set(req.thumbnail_url),
            video_type: Set(req.video_type.to_string()),
            quality_options: Set(quality_text(&req.quality_options)?),
            subtitles_url: Set(req.subtitles_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建视频失败: {e}")))?;

        Ok(result.into_video())
    }

    pub async fn update_video_impl(
        &self,
        id: i64,
        update: UpdateVideoRequest,
    ) -> Result<Option<Video>> {
        if self.get_video_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = VideoActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(video_url) = update.video_url {
            model.video_url = Set(video_url);
        }
        if let Some(duration) = update.duration {
            model.duration = Set(Some(duration));
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            model.thumbnail_url = Set(Some(thumbnail_url));
        }
        if let Some(video_type) = update.video_type {
            model.video_type = Set(video_type.to_string());
        }
        if let Some(ref quality_options) = update.quality_options {
            model.quality_options = Set(quality_text(quality_options)?);
        }
        if let Some(subtitles_url) = update.subtitles_url {
            model.subtitles_url = Set(Some(subtitles_url));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新视频失败: {e}")))?;

        self.get_video_by_id_impl(id).await
    }

    pub async fn delete_video_impl(&self, id: i64) -> Result<bool> {
        let result = Videos::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除视频失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::modules::entities::VideoType;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};

    #[tokio::test]
    async fn test_module_order_appends() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = seed_user(&storage, "author", UserRole::Admin).await;
        let course = seed_course(&storage, user.id, "Course").await;

        let first = seed_module(&storage, course.id, "One").await;
        let second = seed_module(&storage, course.id, "Two").await;
        assert_eq!(first.order_index, 1);
        assert_eq!(second.order_index, 2);
        assert_eq!(storage.count_modules_impl(course.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reorder_modules() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = seed_user(&storage, "author", UserRole::Admin).await;
        let course = seed_course(&storage, user.id, "Course").await;
        let a = seed_module(&storage, course.id, "A").await;
        let b = seed_module(&storage, course.id, "B").await;
        let c = seed_module(&storage, course.id, "C").await;

        let modules = storage
            .reorder_modules_impl(course.id, &[c.id, a.id, b.id])
            .await
            .unwrap();
        let ids: Vec<i64> = modules.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);

        // 缺少模块或混入其他课程的模块
        assert!(
            storage
                .reorder_modules_impl(course.id, &[c.id, a.id])
                .await
                .is_err()
        );
        assert!(
            storage
                .reorder_modules_impl(course.id, &[c.id, a.id, a.id])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_module_content_data_json() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = seed_user(&storage, "author", UserRole::Admin).await;
        let course = seed_course(&storage, user.id, "Course").await;
        let module = seed_module(&storage, course.id, "A").await;

        let updated = storage
            .update_module_impl(
                module.id,
                UpdateModuleRequest {
                    content_data: Some(serde_json::json!({"slides": 12})),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content_data, Some(serde_json::json!({"slides": 12})));
    }

    #[tokio::test]
    async fn test_document_download_count() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = seed_user(&storage, "author", UserRole::Admin).await;
        let course = seed_course(&storage, user.id, "Course").await;
        let module = seed_module(&storage, course.id, "A").await;

        let doc = storage
            .create_document_impl(
                module.id,
                CreateDocumentRequest {
                    title: "Handbook".into(),
                    file_path: "document/handbook.pdf".into(),
                    file_type: ".pdf".into(),
                    file_size: 1024,
                    is_downloadable: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(doc.download_count, 0);

        storage.increment_download_count_impl(doc.id).await.unwrap();
        storage.increment_download_count_impl(doc.id).await.unwrap();
        let doc = storage.get_document_by_id_impl(doc.id).await.unwrap().unwrap();
        assert_eq!(doc.download_count, 2);

        // 删除模块级联删除文档
        storage.delete_module_impl(module.id).await.unwrap();
        assert!(storage.get_document_by_id_impl(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_video_quality_options() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = seed_user(&storage, "author", UserRole::Admin).await;
        let course = seed_course(&storage, user.id, "Course").await;
        let module = seed_module(&storage, course.id, "A").await;

        let video = storage
            .create_video_impl(
                module.id,
                CreateVideoRequest {
                    title: "Welcome".into(),
                    video_url: "https://youtube.com/watch?v=x".into(),
                    duration: Some(90),
                    thumbnail_url: None,
                    video_type: VideoType::Youtube,
                    quality_options: vec!["720p".into(), "1080p".into()],
                    subtitles_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(video.quality_options, vec!["720p", "1080p"]);

        let updated = storage
            .update_video_impl(
                video.id,
                UpdateVideoRequest {
                    duration: Some(120),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.duration, Some(120));
        assert_eq!(updated.video_type, VideoType::Youtube);
    }
}
