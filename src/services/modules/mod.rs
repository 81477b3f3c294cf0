pub mod content;
pub mod documents;
pub mod videos;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::declare_service;
use crate::errors::Result;
use crate::models::{
    courses::entities::Course,
    modules::requests::{
        CreateDocumentRequest, CreateModuleRequest, CreateVideoRequest, ReorderModulesRequest,
        UpdateModuleRequest, UpdateVideoRequest,
    },
    rbac::entities::Permission,
    users::entities::User,
};
use crate::storage::Storage;

declare_service!(ModuleService);

impl ModuleService {
    pub async fn list_modules(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::list_modules(self, course_id, request).await
    }

    pub async fn create_module(
        &self,
        course_id: i64,
        body: CreateModuleRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::create_module(self, course_id, body, request).await
    }

    pub async fn reorder_modules(
        &self,
        course_id: i64,
        body: ReorderModulesRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::reorder_modules(self, course_id, body, request).await
    }

    pub async fn get_module(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::get_module(self, module_id, request).await
    }

    pub async fn update_module(
        &self,
        module_id: i64,
        body: UpdateModuleRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::update_module(self, module_id, body, request).await
    }

    pub async fn delete_module(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        content::delete_module(self, module_id, request).await
    }

    // 文档
    pub async fn list_documents(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        documents::list_documents(self, module_id, request).await
    }

    pub async fn create_document(
        &self,
        module_id: i64,
        body: CreateDocumentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        documents::create_document(self, module_id, body, request).await
    }

    pub async fn delete_document(
        &self,
        document_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        documents::delete_document(self, document_id, request).await
    }

    pub async fn download_document(
        &self,
        document_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        documents::download_document(self, document_id, request).await
    }

    // 视频
    pub async fn list_videos(
        &self,
        module_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        videos::list_videos(self, module_id, request).await
    }

    pub async fn create_video(
        &self,
        module_id: i64,
        body: CreateVideoRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        videos::create_video(self, module_id, body, request).await
    }

    pub async fn update_video(
        &self,
        video_id: i64,
        body: UpdateVideoRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        videos::update_video(self, video_id, body, request).await
    }

    pub async fn delete_video(
        &self,
        video_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        videos::delete_video(self, video_id, request).await
    }
}

/// 用户能否看到课程内容：已发布，或拥有课程/内容管理权限
pub(crate) fn can_view_course(user: &User, course: &Course) -> bool {
    course.is_published()
        || user.has_permission(Permission::CoursesManage)
        || user.has_permission(Permission::ContentManage)
}

/// 查找用户可见的课程
pub(crate) async fn visible_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
) -> Result<Option<Course>> {
    Ok(storage
        .get_course_by_id(course_id)
        .await?
        .filter(|course| can_view_course(user, course)))
}
