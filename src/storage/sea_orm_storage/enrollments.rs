use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::entity::module_progress::{
    ActiveModel as ProgressActiveModel, Column as ProgressColumn, Entity as ModuleProgresses,
};
use crate::entity::modules::{Column as ModuleColumn, Entity as Modules};
use crate::entity::users::Entity as Users;
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    enrollments::{
        entities::{Enrollment, EnrollmentStatus, ModuleProgress, compute_progress},
        responses::{CourseEnrollmentItem, CourseEnrollmentListResponse},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    pub async fn get_enrollment_impl(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 选课；已退课的记录重新激活，重复选课报错
    pub async fn create_enrollment_impl(
        &self,
        user_id: i64,
        course_id: i64,
        due_date: Option<i64>,
        assigned_by: Option<i64>,
    ) -> Result<Enrollment> {
        let now = chrono::Utc::now().timestamp();

        let existing = Enrollments::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        if let Some(existing) = existing {
            if existing.status != EnrollmentStatus::Dropped.as_str() {
                return Err(LmsError::business_rule(
                    "User is already enrolled in this course",
                ));
            }

            let id = existing.id;
            let mut model: ActiveModel = existing.into();
            model.status = Set(EnrollmentStatus::Enrolled.to_string());
            model.enrolled_at = Set(now);
            model.due_date = Set(due_date);
            model.assigned_by = Set(assigned_by);
            model
                .update(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("恢复选课记录失败: {e}")))?;

            return self
                .recompute_enrollment_progress_impl(user_id, course_id)
                .await?
                .ok_or_else(|| LmsError::not_found(format!("Enrollment {id} not found")));
        }

        let model = ActiveModel {
            user_id: Set(user_id),
            course_id: Set(course_id),
            enrolled_at: Set(now),
            started_at: Set(None),
            completed_at: Set(None),
            progress_percentage: Set(0.0),
            status: Set(EnrollmentStatus::Enrolled.to_string()),
            due_date: Set(due_date),
            assigned_by: Set(assigned_by),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                LmsError::business_rule("User is already enrolled in this course")
            } else {
                LmsError::database_operation(format!("创建选课记录失败: {e}"))
            }
        })?;

        Ok(result.into_enrollment())
    }

    /// 分页列出课程的选课记录
    pub async fn list_course_enrollments_impl(
        &self,
        course_id: i64,
        query: PaginationQuery,
    ) -> Result<CourseEnrollmentListResponse> {
        let (page, size) = query.normalized();
        let now = chrono::Utc::now();

        let paginator = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .find_also_related(Users)
            .order_by_desc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课列表失败: {e}")))?;

        let items = rows
            .into_iter()
            .filter_map(|(enrollment, user)| {
                let enrollment = enrollment.into_enrollment();
                user.map(|u| CourseEnrollmentItem {
                    is_overdue: enrollment.is_overdue_at(now),
                    enrollment,
                    user: u.into_user(),
                })
            })
            .collect();

        Ok(CourseEnrollmentListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    pub async fn count_course_enrollments_impl(&self, course_id: i64) -> Result<u64> {
        Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计选课数量失败: {e}")))
    }

    /// 用户的选课记录，排除已删除的课程
    pub async fn list_user_enrollments_impl(
        &self,
        user_id: i64,
    ) -> Result<Vec<(Enrollment, String)>> {
        let rows = Enrollments::find()
            .filter(Column::UserId.eq(user_id))
            .find_also_related(Courses)
            .filter(CourseColumn::DeletedAt.is_null())
            .order_by_desc(Column::EnrolledAt)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, course)| {
                course.map(|c| (enrollment.into_enrollment(), c.title))
            })
            .collect())
    }

    /// 退课
    pub async fn drop_enrollment_impl(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        let existing = Enrollments::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.status = Set(EnrollmentStatus::Dropped.to_string());
        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("退课失败: {e}")))?;

        Ok(Some(updated.into_enrollment()))
    }

    /// 标记模块完成，重复标记返回 false
    pub async fn mark_module_complete_impl(&self, user_id: i64, module_id: i64) -> Result<bool> {
        let existing = ModuleProgresses::find()
            .filter(ProgressColumn::UserId.eq(user_id))
            .filter(ProgressColumn::ModuleId.eq(module_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块进度失败: {e}")))?;

        if existing.is_some() {
            return Ok(false);
        }

        let model = ProgressActiveModel {
            user_id: Set(user_id),
            module_id: Set(module_id),
            completed_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(LmsError::database_operation(format!(
                "记录模块完成失败: {e}"
            ))),
        }
    }

    /// 用户在课程内的模块完成记录
    pub async fn list_module_progress_impl(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Vec<ModuleProgress>> {
        let models = ModuleProgresses::find()
            .inner_join(Modules)
            .filter(ProgressColumn::UserId.eq(user_id))
            .filter(ModuleColumn::CourseId.eq(course_id))
            .order_by_asc(ProgressColumn::CompletedAt)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询模块进度失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_progress()).collect())
    }

    /// 重新计算课程下全部选课记录的进度
    pub async fn recompute_course_progress_impl(&self, course_id: i64) -> Result<()> {
        let user_ids: Vec<i64> = Enrollments::find()
            .select_only()
            .column(Column::UserId)
            .filter(Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        for user_id in user_ids {
            self.recompute_enrollment_progress_impl(user_id, course_id)
                .await?;
        }
        Ok(())
    }

    /// 重新计算选课进度
    pub async fn recompute_enrollment_progress_impl(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        let existing = Enrollments::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let total_modules = Modules::find()
            .filter(ModuleColumn::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计模块数量失败: {e}")))?;

        let completed_modules = ModuleProgresses::find()
            .inner_join(Modules)
            .filter(ProgressColumn::UserId.eq(user_id))
            .filter(ModuleColumn::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计完成模块失败: {e}")))?;

        let (percentage, status) = compute_progress(completed_modules, total_modules);
        let now = chrono::Utc::now().timestamp();
        let dropped = existing.status == EnrollmentStatus::Dropped.as_str();
        let started_at = existing.started_at;
        let completed_at = existing.completed_at;

        let mut model: ActiveModel = existing.into();
        model.progress_percentage = Set(percentage);
        // 退课状态不随进度变化
        if !dropped {
            model.status = Set(status.to_string());
        }
        if percentage > 0.0 && started_at.is_none() {
            model.started_at = Set(Some(now));
        }
        match status {
            EnrollmentStatus::Completed if completed_at.is_none() => {
                model.completed_at = Set(Some(now));
            }
            EnrollmentStatus::Completed => {}
            _ => model.completed_at = Set(None),
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新选课进度失败: {e}")))?;

        Ok(Some(updated.into_enrollment()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::fixtures::{seed_course, seed_module, seed_user};

    #[tokio::test]
    async fn test_duplicate_enrollment_rejected() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let learner = seed_user(&storage, "learner", UserRole::Employee).await;
        let course = seed_course(&storage, admin.id, "Course").await;

        let enrollment = storage
            .create_enrollment_impl(learner.id, course.id, None, None)
            .await
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);

        let err = storage
            .create_enrollment_impl(learner.id, course.id, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_concurrent_enrollment_rejected_not_failed() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let learner = seed_user(&storage, "learner", UserRole::Employee).await;
        let course = seed_course(&storage, admin.id, "Course").await;

        let (a, b) = tokio::join!(
            storage.create_enrollment_impl(learner.id, course.id, None, None),
            storage.create_enrollment_impl(learner.id, course.id, None, None),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_concurrent_module_completion_is_idempotent() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let learner = seed_user(&storage, "learner", UserRole::Employee).await;
        let course = seed_course(&storage, admin.id, "Course").await;
        let module = seed_module(&storage, course.id, "One").await;

        let (a, b) = tokio::join!(
            storage.mark_module_complete_impl(learner.id, module.id),
            storage.mark_module_complete_impl(learner.id, module.id),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a ^ b);
        assert_eq!(
            storage
                .list_module_progress_impl(learner.id, course.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_progress_recomputed_from_modules() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let learner = seed_user(&storage, "learner", UserRole::Employee).await;
        let course = seed_course(&storage, admin.id, "Course").await;
        let m1 = seed_module(&storage, course.id, "One").await;
        let m2 = seed_module(&storage, course.id, "Two").await;
        storage
            .create_enrollment_impl(learner.id, course.id, None, Some(admin.id))
            .await
            .unwrap();

        assert!(storage.mark_module_complete_impl(learner.id, m1.id).await.unwrap());
        assert!(!storage.mark_module_complete_impl(learner.id, m1.id).await.unwrap());

        let enrollment = storage
            .recompute_enrollment_progress_impl(learner.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 50.0);
        assert_eq!(enrollment.status, EnrollmentStatus::InProgress);
        assert!(enrollment.started_at.is_some());
        assert!(enrollment.completed_at.is_none());

        storage.mark_module_complete_impl(learner.id, m2.id).await.unwrap();
        let enrollment = storage
            .recompute_enrollment_progress_impl(learner.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress_percentage, 100.0);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert!(enrollment.completed_at.is_some());

        let progress = storage
            .list_module_progress_impl(learner.id, course.id)
            .await
            .unwrap();
        assert_eq!(progress.len(), 2);
    }

    #[tokio::test]
    async fn test_drop_and_reenroll() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let learner = seed_user(&storage, "learner", UserRole::Employee).await;
        let course = seed_course(&storage, admin.id, "Course").await;
        seed_module(&storage, course.id, "One").await;

        storage
            .create_enrollment_impl(learner.id, course.id, None, None)
            .await
            .unwrap();
        let dropped = storage
            .drop_enrollment_impl(learner.id, course.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dropped.status, EnrollmentStatus::Dropped);

        let again = storage
            .create_enrollment_impl(learner.id, course.id, None, None)
            .await
            .unwrap();
        assert_eq!(again.id, dropped.id);
        assert_eq!(again.status, EnrollmentStatus::Enrolled);
    }

    #[tokio::test]
    async fn test_course_enrollment_listing() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let admin = seed_user(&storage, "admin", UserRole::Admin).await;
        let course = seed_course(&storage, admin.id, "Course").await;
        for name in ["u1", "u2", "u3"] {
            let user = seed_user(&storage, name, UserRole::Employee).await;
            storage
                .create_enrollment_impl(user.id, course.id, Some(0), Some(admin.id))
                .await
                .unwrap();
        }

        let page = storage
            .list_course_enrollments_impl(course.id, PaginationQuery { page: 1, size: 2 })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(
            storage.count_course_enrollments_impl(course.id).await.unwrap(),
            3
        );
        // 截止时间为 1970 年
        assert!(page.items.iter().all(|i| i.is_overdue));

        let mine = storage
            .list_user_enrollments_impl(page.items[0].user.id)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].1, "Course");
    }
}
