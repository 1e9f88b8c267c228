//! # 身份验证路由控制器
//!
//! 实现注册、登录、注销等鉴权相关接口。
//! 字段校验沿用序列化器惯例：所有字段错误按字段名聚合，一次性返回。

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ApiError, FieldErrors};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::server::AppState;
use crate::types::{Claims, DetailResponse, LoginRequest, LoginResponse, SignUpRequest, UserResponse};
use kabu_core::identity::entity::{NewUser, UserRole};

const JWT_EXPIRES_IN: usize = 86400 * 7; // 7 days

/// 密码最小长度
const PASSWORD_MIN_LEN: usize = 6;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is static"))
        .is_match(email)
}

/// 提取必填的字符串字段，缺失或全空白时记录字段错误。
fn required_field(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        None => {
            errors.add(field, "This field is required.");
            None
        }
        Some("") => {
            errors.add(field, "This field may not be blank.");
            None
        }
        Some(v) => Some(v.to_string()),
    }
}

/// 用户注册
///
/// 创建一个 `Standard` 角色的新账户。用户名与邮箱全局唯一，
/// 两项唯一性检查与其余字段校验一并执行、一并报告。
#[utoipa::path(
    post,
    path = "/users/",
    tag = "鉴权 (Auth)",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "注册成功", body = UserResponse),
        (status = 400, description = "字段校验失败（缺失、格式非法、用户名或邮箱已占用、密码过短）")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut errors = FieldErrors::default();

    let username = required_field(&mut errors, "username", &req.username);
    let email = required_field(&mut errors, "email", &req.email);
    let password = required_field(&mut errors, "password", &req.password);

    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    if let Some(password) = &password {
        if password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Ensure this field has at least {} characters.", PASSWORD_MIN_LEN),
            );
        }
    }

    // 唯一性检查与字段校验同轮执行：重复的用户名/邮箱
    // 与其它字段错误一并返回
    if let Some(username) = &username {
        let taken = state
            .user_store
            .find_user_by_username(username)
            .await
            .map_err(|e| ApiError::Internal(format!("DB Error: {}", e)))?;
        if taken.is_some() {
            errors.add("username", "This field must be unique.");
        }
    }
    if let Some(email) = &email {
        let taken = state
            .user_store
            .find_user_by_email(email)
            .await
            .map_err(|e| ApiError::Internal(format!("DB Error: {}", e)))?;
        if taken.is_some() {
            errors.add("email", "This field must be unique.");
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(ApiError::Internal("Validation passed with missing fields".into()));
    };

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|_| ApiError::Internal("Failed to hash password".into()))?;

    let user = state
        .user_store
        .insert_user(&NewUser {
            username,
            email,
            password_hash,
            role: UserRole::Standard,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!("New user registered: {} (id={})", user.username, user.id.0);
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// 用户登录
///
/// 验证用户名和密码，颁发 JWT Token。凭据错误统一返回 400，
/// 不区分“用户不存在”与“密码错误”。
#[utoipa::path(
    post,
    path = "/login/",
    tag = "鉴权 (Auth)",
    request_body = LoginRequest,
    responses(
        (status = 202, description = "登录成功", body = LoginResponse),
        (status = 400, description = "字段缺失或用户名密码错误")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let mut errors = FieldErrors::default();
    let username = required_field(&mut errors, "username", &req.username);
    let password = required_field(&mut errors, "password", &req.password);

    if let Some(password) = &password {
        if password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Ensure this field has at least {} characters.", PASSWORD_MIN_LEN),
            );
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::Internal("Validation passed with missing fields".into()));
    };

    // 1. 获取用户
    let user = state
        .user_store
        .find_user_by_username(&username)
        .await
        .map_err(|e| ApiError::Internal(format!("DB error: {}", e)))?;

    let user = match user {
        Some(u) => u,
        None => {
            return Err(ApiError::Validation(FieldErrors::single(
                "detail",
                "Could not login with the supplied credentials",
            )));
        }
    };

    // 2. 验证密码
    let valid = bcrypt::verify(&password, &user.password_hash).unwrap_or(false);

    if !valid {
        return Err(ApiError::Validation(FieldErrors::single(
            "detail",
            "Could not login with the supplied credentials",
        )));
    }

    // 3. 生成 JWT
    let exp = usize::try_from(Utc::now().timestamp())
        .map_err(|_| ApiError::Internal("System clock before epoch".into()))?
        + JWT_EXPIRES_IN;
    let claims = Claims {
        sub: user.id.0.to_string(),
        role: user.role.to_string(),
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.app_config.server.jwt_secret.as_ref()),
    )
    .map_err(|_| ApiError::Internal("Failed to generate token".into()))?;

    tracing::info!("User {} logged in", user.username);
    Ok((
        StatusCode::ACCEPTED,
        Json(LoginResponse {
            username: user.username,
            token,
        }),
    ))
}

/// 用户注销
///
/// 仅限已认证会话调用。服务端不维护 Token 黑名单：
/// 已签发的 Token 在自然过期前仍然可用，注销是幂等的会话确认。
#[utoipa::path(
    get,
    path = "/logout/",
    tag = "鉴权 (Auth)",
    security(("bearer_jwt" = [])),
    responses(
        (status = 200, description = "注销成功", body = DetailResponse),
        (status = 401, description = "未认证")
    )
)]
pub async fn logout(CurrentUser(user): CurrentUser) -> Json<DetailResponse> {
    tracing::info!("User {} logged out", user.username);
    Json(DetailResponse::from_msg("Logout successful"))
}
