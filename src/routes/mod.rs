pub mod audit;
pub mod auth;
pub mod categories;
pub mod courses;
pub mod departments;
pub mod files;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod roles;
pub mod users;

use actix_web::web;

pub use audit::configure_audit_routes;
pub use auth::configure_auth_routes;
pub use categories::configure_category_routes;
pub use courses::configure_course_routes;
pub use departments::configure_department_routes;
pub use files::configure_file_routes;
pub use modules::{configure_course_module_routes, configure_module_routes};
pub use progress::configure_progress_routes;
pub use quizzes::{configure_module_quiz_routes, configure_quiz_routes};
pub use roles::configure_role_routes;
pub use users::configure_user_routes;

/// 注册全部路由
///
/// scope 按前缀匹配，嵌套前缀必须先于父前缀注册。
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_role_routes)
        .configure(configure_department_routes)
        .configure(configure_category_routes)
        .configure(configure_course_module_routes)
        .configure(configure_course_routes)
        .configure(configure_module_quiz_routes)
        .configure(configure_module_routes)
        .configure(configure_quiz_routes)
        .configure(configure_progress_routes)
        .configure(configure_file_routes)
        .configure(configure_audit_routes);
}
