use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::categories::Entity as Categories;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    courses::{
        entities::{Course, CourseStatus},
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::{CourseListResponse, CourseStatsResponse, NamedCount, PopularCourse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| LmsError::serialization(format!("序列化课程字段失败: {e}")))
}

impl SeaOrmStorage {
    /// 创建课程，初始状态为草稿
    pub async fn create_course_impl(
        &self,
        req: CreateCourseRequest,
        creator_id: i64,
    ) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            category_id: Set(req.category_id),
            creator_id: Set(creator_id),
            status: Set(CourseStatus::Draft.to_string()),
            difficulty_level: Set(req.difficulty_level.to_string()),
            estimated_duration: Set(req.estimated_duration),
            is_mandatory: Set(req.is_mandatory),
            tags: Set(to_json_text(&req.tags)?),
            prerequisites: Set(to_json_text(&req.prerequisites)?),
            thumbnail_url: Set(req.thumbnail_url),
            published_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    /// 获取未删除的课程
    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = PaginationQuery {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(10),
        }
        .normalized();

        let mut select = Courses::find().filter(Column::DeletedAt.is_null());

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Title.contains(&escaped))
                    .add(Column::Description.contains(&escaped)),
            );
        }

        if let Some(category_id) = query.category_id {
            select = select.filter(Column::CategoryId.eq(category_id));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        if let Some(difficulty) = query.difficulty {
            select = select.filter(Column::DifficultyLevel.eq(difficulty.as_str()));
        }

        if let Some(is_mandatory) = query.is_mandatory {
            select = select.filter(Column::IsMandatory.eq(is_mandatory));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程页数失败: {e}")))?;

        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 更新课程
    pub async fn update_course_impl(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(id).await?.is_none() {
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
        if let Some(category_id) = update.category_id {
            model.category_id = Set(Some(category_id));
        }
        if let Some(difficulty) = update.difficulty_level {
            model.difficulty_level = Set(difficulty.to_string());
        }
        if let Some(duration) = update.estimated_duration {
            model.estimated_duration = Set(Some(duration));
        }
        if let Some(is_mandatory) = update.is_mandatory {
            model.is_mandatory = Set(is_mandatory);
        }
        if let Some(ref tags) = update.tags {
            model.tags = Set(to_json_text(tags)?);
        }
        if let Some(ref prerequisites) = update.prerequisites {
            model.prerequisites = Set(to_json_text(prerequisites)?);
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            model.thumbnail_url = Set(Some(thumbnail_url));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_course_by_id_impl(id).await
    }

    /// 软删除课程
    pub async fn soft_delete_course_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Courses::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新课程状态
    pub async fn set_course_status_impl(
        &self,
        id: i64,
        status: CourseStatus,
    ) -> Result<Option<Course>> {
        let now = chrono::Utc::now().timestamp();

        let mut update = Courses::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now));
        if status == CourseStatus::Published {
            update = update.col_expr(Column::PublishedAt, Expr::value(now));
        }

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新课程状态失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_course_by_id_impl(id).await
    }

    pub async fn count_existing_courses_impl(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        Courses::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .filter(Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程失败: {e}")))
    }

    /// 课程统计
    pub async fn get_course_stats_impl(&self) -> Result<CourseStatsResponse> {
        let alive = || Courses::find().filter(Column::DeletedAt.is_null());

        let total_courses = alive()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计课程数量失败: {e}")))?;

        let by_status: Vec<(String, i64)> = alive()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Status)
            .order_by_asc(Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按状态统计课程失败: {e}")))?;

        let by_difficulty: Vec<(String, i64)> = alive()
            .select_only()
            .column(Column::DifficultyLevel)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::DifficultyLevel)
            .order_by_asc(Column::DifficultyLevel)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按难度统计课程失败: {e}")))?;

        let by_category_id: Vec<(Option<i64>, i64)> = alive()
            .select_only()
            .column(Column::CategoryId)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按分类统计课程失败: {e}")))?;

        let category_names: HashMap<i64, String> = Categories::find()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询分类失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut by_category: Vec<NamedCount> = by_category_id
            .into_iter()
            .map(|(category_id, count)| NamedCount {
                name: category_id
                    .and_then(|id| category_names.get(&id).cloned())
                    .unwrap_or_else(|| "uncategorized".to_string()),
                count,
            })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        // 选课人数前 5 的课程
        let top: Vec<(i64, i64)> = Enrollments::find()
            .select_only()
            .column(EnrollmentColumn::CourseId)
            .column_as(EnrollmentColumn::Id.count(), "count")
            .inner_join(Courses)
            .filter(Column::DeletedAt.is_null())
            .group_by(EnrollmentColumn::CourseId)
            .order_by_desc(EnrollmentColumn::Id.count())
            .limit(5)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计热门课程失败: {e}")))?;

        let mut most_popular = Vec::with_capacity(top.len());
        for (course_id, enrollment_count) in top {
            if let Some(course) = self.get_course_by_id_impl(course_id).await? {
                most_popular.push(PopularCourse {
                    course_id,
                    title: course.title,
                    enrollment_count,
                });
            }
        }

        let named = |rows: Vec<(String, i64)>| {
            rows.into_iter()
                .map(|(name, count)| NamedCount { name, count })
                .collect()
        };

        Ok(CourseStatsResponse {
            total_courses: total_courses as i64,
            by_status: named(by_status),
            by_category,
            by_difficulty: named(by_difficulty),
            most_popular,
        })
    }
}
