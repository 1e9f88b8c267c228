//! # 鉴权中间件
//!
//! 提供基于 JWT 的身份验证与管理员角色控制。
//! 授权表是静态的：公开路由不挂载任何层，会话路由挂载
//! `auth_middleware`，管理员路由在其上再挂载 `require_admin`，
//! 全部在处理器执行之前完成判定。

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::Claims;
use kabu_core::identity::entity::{User, UserId, UserRole};

/// 提取并验证 Authorization: Bearer <token>
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req.headers().get(axum::http::header::AUTHORIZATION);

    let token = match auth_header {
        Some(header_val) => {
            let s = header_val
                .to_str()
                .map_err(|_| ApiError::Unauthorized("Invalid auth header".into()))?;
            if !s.starts_with("Bearer ") {
                tracing::warn!("Invalid Bearer format: {}", s);
                return Err(ApiError::Unauthorized("Invalid Bearer format".into()));
            }
            s[7..].to_string()
        }
        None => {
            return Err(ApiError::Unauthorized(
                "Authentication credentials were not provided.".into(),
            ));
        }
    };

    let claims = match verify_jwt(&token, state.app_config.server.jwt_secret.as_bytes()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("JWT verification failed: {:?}", e);
            return Err(e);
        }
    };

    // Token 主题是用户主键；用户可能在签发后被移除，因此仍需回表确认
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let user = state
        .user_store
        .get_user(UserId(user_id))
        .await
        .map_err(|e| ApiError::Internal(format!("DB Error: {}", e)))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    // 将用户信息注入 request extensions
    // 以便 downstream handlers 用 `CurrentUser` 提取
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Admin 级别权限校验中间件
/// 必须在 `auth_middleware` 之后应用！
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| ApiError::Unauthorized("User context not found".into()))?;

    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin privileges required".into()));
    }

    Ok(next.run(req).await)
}

/// 验证 JWT 返回强类型 Claims
pub fn verify_jwt(token: &str, secret: &[u8]) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    Ok(token_data.claims)
}

// 在提取器中获取当前用户的快捷方式
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Missing User Context".into()))?;
        Ok(CurrentUser(user))
    }
}
