pub mod enroll;
pub mod get;
pub mod list;
pub mod manage;
pub mod publish;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::declare_service;
use crate::errors::Result;
use crate::models::{
    ErrorCode, PaginationQuery,
    courses::requests::{
        BulkEnrollRequest, CourseListParams, CreateCourseRequest, UpdateCourseRequest,
    },
};
use crate::services::bad_request;
use crate::storage::Storage;

declare_service!(CourseService);

impl CourseService {
    // 课程列表
    pub async fn list_courses(
        &self,
        query: CourseListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_courses(self, query, request).await
    }

    // 课程统计
    pub async fn get_course_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::get_course_stats(self, request).await
    }

    // 课程详情
    pub async fn get_course(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_course(self, course_id, request).await
    }

    // 创建课程
    pub async fn create_course(
        &self,
        body: CreateCourseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_course(self, body, request).await
    }

    // 更新课程
    pub async fn update_course(
        &self,
        course_id: i64,
        body: UpdateCourseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_course(self, course_id, body, request).await
    }

    // 删除课程
    pub async fn delete_course(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::delete_course(self, course_id, request).await
    }

    // 发布课程
    pub async fn publish_course(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        publish::publish_course(self, course_id, request).await
    }

    // 归档课程
    pub async fn archive_course(
        &self,
        course_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        publish::archive_course(self, course_id, request).await
    }

    // 自主选课
    pub async fn enroll(&self, course_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        enroll::enroll_self(self, course_id, request).await
    }

    // 批量选课
    pub async fn bulk_enroll(
        &self,
        course_id: i64,
        body: BulkEnrollRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enroll::bulk_enroll(self, course_id, body, request).await
    }

    // 课程选课名单
    pub async fn list_enrollments(
        &self,
        course_id: i64,
        query: PaginationQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enroll::list_enrollments(self, course_id, query, request).await
    }
}

/// 校验分类与先修课程引用，返回 400 响应或 None
pub(crate) async fn check_references(
    storage: &Arc<dyn Storage>,
    course_id: Option<i64>,
    category_id: Option<i64>,
    prerequisites: Option<&[i64]>,
) -> Result<Option<HttpResponse>> {
    if let Some(category_id) = category_id
        && storage.get_category_by_id(category_id).await?.is_none()
    {
        return Ok(Some(bad_request(
            ErrorCode::CategoryNotFound,
            "Category not found",
        )));
    }

    let Some(prerequisites) = prerequisites else {
        return Ok(None);
    };

    let mut ids = prerequisites.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if course_id.is_some_and(|id| ids.contains(&id)) {
        return Ok(Some(bad_request(
            ErrorCode::BadRequest,
            "Course cannot be its own prerequisite",
        )));
    }
    if !ids.is_empty() && storage.count_existing_courses(&ids).await? != ids.len() as u64 {
        return Ok(Some(bad_request(
            ErrorCode::CourseNotFound,
            "Prerequisite course not found",
        )));
    }

    Ok(None)
}
