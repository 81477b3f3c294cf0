use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::users::responses::UserDetailResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::not_found;

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let Some(user) = storage.get_user_by_id(user_id).await? else {
        return Ok(not_found(ErrorCode::UserNotFound, "User not found"));
    };

    let department_name = match user.department_id {
        Some(id) => storage.get_department_by_id(id).await?.map(|d| d.name),
        None => None,
    };
    let (total_enrollments, completed_courses, quiz_attempts) =
        storage.get_user_learning_stats(user.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserDetailResponse {
            user,
            department_name,
            total_enrollments,
            completed_courses,
            quiz_attempts,
        },
        "User information retrieved successfully",
    )))
}

pub async fn get_user_stats(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let stats = storage.get_user_stats().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        stats,
        "User statistics retrieved successfully",
    )))
}
