/*!
 * 基于权限的访问控制中间件
 *
 * 必须放在 RequireJWT 之后（actix 中后 wrap 的先执行，所以写在 RequireJWT 前面）。
 *
 * ```rust,ignore
 * web::scope("/departments")
 *     .route(
 *         "",
 *         web::post()
 *             .to(create_department)
 *             .wrap(RequirePermission::new(Permission::DepartmentsManage)),
 *     )
 *     .wrap(RequireJWT)
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{ErrorCode, rbac::entities::Permission, users::entities::User};

use super::create_error_response;

#[derive(Clone)]
pub struct RequirePermission {
    required: Vec<Permission>,
}

impl RequirePermission {
    /// 需要指定权限
    pub fn new(permission: Permission) -> Self {
        Self {
            required: vec![permission],
        }
    }

    /// 拥有任一权限即可
    pub fn new_any(permissions: &[Permission]) -> Self {
        Self {
            required: permissions.to_vec(),
        }
    }

    pub fn allows(&self, user: &User) -> bool {
        self.required.iter().any(|p| user.has_permission(*p))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequirePermission
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequirePermissionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequirePermissionMiddleware {
            service: Rc::new(service),
            guard: self.clone(),
        }))
    }
}

pub struct RequirePermissionMiddleware<S> {
    service: Rc<S>,
    guard: RequirePermission,
}

impl<S, B> Service<ServiceRequest> for RequirePermissionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let guard = self.guard.clone();

        Box::pin(async move {
            let user = req.extensions().get::<User>().cloned();

            match user {
                Some(user) if guard.allows(&user) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Some(user) => {
                    info!(
                        "Access denied for user {} (role: {}). Required any of: {:?}",
                        user.id, user.role, guard.required
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::FORBIDDEN,
                            ErrorCode::Forbidden,
                            "Insufficient permissions",
                        )
                        .map_into_right_body(),
                    ))
                }
                None => {
                    info!(
                        "Permission check failed: no authenticated user on {}. RequireJWT must run first.",
                        req.path()
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "Authentication required",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    fn user_with_role(role: UserRole) -> User {
        User {
            id: 9,
            username: "tester".into(),
            email: "tester@example.com".into(),
            password_hash: String::new(),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone: None,
            role,
            department_id: None,
            avatar_url: None,
            is_active: true,
            is_verified: true,
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_allows_by_matrix() {
        let guard = RequirePermission::new(Permission::QuizzesManage);
        assert!(guard.allows(&user_with_role(UserRole::ResourcePersonnel)));
        assert!(guard.allows(&user_with_role(UserRole::Admin)));
        assert!(!guard.allows(&user_with_role(UserRole::Hr)));

        let any = RequirePermission::new_any(&[Permission::UsersView, Permission::ReportsView]);
        assert!(any.allows(&user_with_role(UserRole::ResourcePersonnel)));
        assert!(!any.allows(&user_with_role(UserRole::Employee)));
    }

    #[actix_web::test]
    async fn test_middleware_rejects_without_permission() {
        let app = actix_test::init_service(
            App::new()
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(user_with_role(UserRole::Employee));
                    actix_service::Service::call(srv, req)
                })
                .route(
                    "/secure",
                    web::get()
                        .to(|| async { HttpResponse::Ok().finish() })
                        .wrap(RequirePermission::new(Permission::CoursesManage)),
                ),
        )
        .await;
        let req = actix_test::TestRequest::get().uri("/secure").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_middleware_requires_user() {
        let app = actix_test::init_service(
            App::new().route(
                "/secure",
                web::get()
                    .to(|| async { HttpResponse::Ok().finish() })
                    .wrap(RequirePermission::new(Permission::CoursesManage)),
            ),
        )
        .await;
        let req = actix_test::TestRequest::get().uri("/secure").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
