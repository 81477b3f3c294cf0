pub mod login;
pub mod logout;
pub mod mail;
pub mod password;
pub mod register;
pub mod token;
pub mod verify;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::declare_service;
use crate::models::auth::requests::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
};

declare_service!(AuthService);

impl AuthService {
    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 登录验证
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 用户注册
    pub async fn register(
        &self,
        register_request: RegisterRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::handle_register(self, register_request, request).await
    }

    // 刷新令牌
    pub async fn refresh_token(
        &self,
        body: RefreshTokenRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        token::handle_refresh_token(self, body, request).await
    }

    // 登出
    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        logout::handle_logout(request).await
    }

    // 当前用户信息
    pub async fn get_user(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_get_user(request).await
    }

    // 忘记密码
    pub async fn forgot_password(
        &self,
        body: ForgotPasswordRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        password::handle_forgot_password(self, body, request).await
    }

    // 通过重置令牌设置新密码
    pub async fn reset_password(
        &self,
        body: ResetPasswordRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        password::handle_reset_password(self, body, request).await
    }

    // 修改密码
    pub async fn change_password(
        &self,
        body: ChangePasswordRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        password::handle_change_password(self, body, request).await
    }

    // 验证邮箱
    pub async fn verify_email(
        &self,
        body: VerifyEmailRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        verify::handle_verify_email(self, body, request).await
    }
}
