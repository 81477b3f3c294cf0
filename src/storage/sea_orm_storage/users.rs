use super::SeaOrmStorage;
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::entity::quiz_attempts::{Column as AttemptColumn, Entity as QuizAttempts};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, PaginationQuery,
    enrollments::entities::EnrollmentStatus,
    users::{
        entities::User,
        requests::{CreateUserRequest, SortOrder, UpdateUserRequest, UserListQuery, UserSortField},
        responses::{RoleCount, UserListResponse, UserStatsResponse},
    },
};
use crate::storage::UserLearningStats;
use crate::utils::escape_like_pattern;
use chrono::Datelike;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(
        &self,
        req: CreateUserRequest,
        verification_token: Option<String>,
    ) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            phone: Set(req.phone),
            role: Set(req.role.to_string()),
            department_id: Set(req.department_id),
            is_active: Set(req.is_active),
            is_verified: Set(verification_token.is_none()),
            verification_token: Set(verification_token),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名或邮箱获取用户
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        let result = Users::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户，不含已删除用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let (page, size) = PaginationQuery {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(10),
        }
        .normalized();

        let mut select = Users::find().filter(Column::DeletedAt.is_null());

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped))
                    .add(Column::FirstName.contains(&escaped))
                    .add(Column::LastName.contains(&escaped)),
            );
        }

        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        if let Some(department_id) = query.department_id {
            select = select.filter(Column::DepartmentId.eq(department_id));
        }

        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        // 排序
        let order = match query.sort_order {
            Some(SortOrder::Asc) => Order::Asc,
            _ => Order::Desc,
        };
        select = match query.sort_by.unwrap_or(UserSortField::CreatedAt) {
            UserSortField::CreatedAt => select.order_by(Column::CreatedAt, order),
            UserSortField::Name => select
                .order_by(Column::FirstName, order.clone())
                .order_by(Column::LastName, order),
            UserSortField::Email => select.order_by(Column::Email, order),
        }
        .order_by_asc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户页数失败: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新最后登录时间失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let existing = Users::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询用户失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }

        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }

        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone));
        }

        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }

        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }

        if let Some(department_id) = update.department_id {
            model.department_id = Set(Some(department_id));
        }

        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新用户失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    /// 软删除用户
    pub async fn soft_delete_user_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新密码并清除重置令牌
    pub async fn update_password_impl(&self, id: i64, password_hash: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::PasswordHash, Expr::value(password_hash))
            .col_expr(Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(Column::ResetTokenExpires, Expr::value(Option::<i64>::None))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新密码失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 保存密码重置令牌
    pub async fn set_reset_token_impl(&self, id: i64, token: &str, expires_at: i64) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(Column::ResetToken, Expr::value(token))
            .col_expr(Column::ResetTokenExpires, Expr::value(expires_at))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("保存重置令牌失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 通过未过期的重置令牌获取用户
    pub async fn get_user_by_reset_token_impl(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::ResetToken.eq(token))
            .filter(Column::ResetTokenExpires.gt(now))
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询重置令牌失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 校验邮箱验证令牌
    pub async fn verify_email_impl(&self, id: i64, token: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::IsVerified, Expr::value(true))
            .col_expr(Column::VerificationToken, Expr::value(Option::<String>::None))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::VerificationToken.eq(token))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("验证邮箱失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 用户统计
    pub async fn get_user_stats_impl(&self) -> Result<UserStatsResponse> {
        let alive = || Users::find().filter(Column::DeletedAt.is_null());

        let total_users = alive()
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计用户数量失败: {e}")))?;

        let active_users = alive()
            .filter(Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计活跃用户失败: {e}")))?;

        let month_start = chrono::Utc::now()
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc().timestamp())
            .unwrap_or_default();

        let new_users_this_month = alive()
            .filter(Column::CreatedAt.gte(month_start))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计新用户失败: {e}")))?;

        let by_role: Vec<(String, i64)> = alive()
            .select_only()
            .column(Column::Role)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Role)
            .order_by_asc(Column::Role)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("按角色统计用户失败: {e}")))?;

        Ok(UserStatsResponse {
            total_users: total_users as i64,
            active_users: active_users as i64,
            new_users_this_month: new_users_this_month as i64,
            users_by_role: by_role
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
        })
    }

    /// 用户学习统计
    pub async fn get_user_learning_stats_impl(&self, id: i64) -> Result<UserLearningStats> {
        let total_enrollments = Enrollments::find()
            .filter(EnrollmentColumn::UserId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计选课数失败: {e}")))?;

        let completed = Enrollments::find()
            .filter(EnrollmentColumn::UserId.eq(id))
            .filter(EnrollmentColumn::Status.eq(EnrollmentStatus::Completed.as_str()))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计完成课程失败: {e}")))?;

        let attempts = QuizAttempts::find()
            .filter(AttemptColumn::UserId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计测验次数失败: {e}")))?;

        Ok((total_enrollments as i64, completed as i64, attempts as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn user_request(username: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hashed".to_string(),
            first_name: "Test".to_string(),
            last_name: username.to_string(),
            phone: None,
            role,
            department_id: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user_impl(user_request("alice", UserRole::Employee), None)
            .await
            .unwrap();
        assert!(user.is_verified);

        let by_email = storage
            .get_user_by_username_or_email_impl("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_soft_deleted_user_hidden_from_list() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let alice = storage
            .create_user_impl(user_request("alice", UserRole::Employee), None)
            .await
            .unwrap();
        storage
            .create_user_impl(user_request("bob", UserRole::Hr), None)
            .await
            .unwrap();

        assert!(storage.soft_delete_user_impl(alice.id).await.unwrap());
        assert!(!storage.soft_delete_user_impl(alice.id).await.unwrap());

        let list = storage
            .list_users_with_pagination_impl(UserListQuery::default())
            .await
            .unwrap();
        assert_eq!(list.pagination.total, 1);
        assert_eq!(list.items[0].username, "bob");

        let deleted = storage.get_user_by_id_impl(alice.id).await.unwrap().unwrap();
        assert!(!deleted.is_active);
    }

    #[tokio::test]
    async fn test_search_escapes_like_wildcards() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        storage
            .create_user_impl(user_request("alice", UserRole::Employee), None)
            .await
            .unwrap();

        let list = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list.pagination.total, 0);

        let list = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("ALI".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(list.items.len() <= 1);
    }

    #[tokio::test]
    async fn test_reset_token_expiry() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user_impl(user_request("carol", UserRole::Employee), None)
            .await
            .unwrap();

        storage
            .set_reset_token_impl(user.id, "tok", 1_000)
            .await
            .unwrap();
        assert!(
            storage
                .get_user_by_reset_token_impl("tok", 999)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            storage
                .get_user_by_reset_token_impl("tok", 1_000)
                .await
                .unwrap()
                .is_none()
        );

        storage.update_password_impl(user.id, "new").await.unwrap();
        assert!(
            storage
                .get_user_by_reset_token_impl("tok", 999)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_verify_email_requires_matching_token() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user_impl(
                user_request("dave", UserRole::Employee),
                Some("verify-me".to_string()),
            )
            .await
            .unwrap();
        assert!(!user.is_verified);

        assert!(!storage.verify_email_impl(user.id, "wrong").await.unwrap());
        assert!(storage.verify_email_impl(user.id, "verify-me").await.unwrap());

        let user = storage.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert!(user.is_verified);
    }

    #[tokio::test]
    async fn test_user_stats_by_role() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        storage
            .create_user_impl(user_request("e1", UserRole::Employee), None)
            .await
            .unwrap();
        storage
            .create_user_impl(user_request("e2", UserRole::Employee), None)
            .await
            .unwrap();
        storage
            .create_user_impl(user_request("h1", UserRole::Hr), None)
            .await
            .unwrap();

        let stats = storage.get_user_stats_impl().await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.new_users_this_month, 3);
        let employees = stats
            .users_by_role
            .iter()
            .find(|r| r.role == "employee")
            .unwrap();
        assert_eq!(employees.count, 2);
    }
}
