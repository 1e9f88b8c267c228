//! # API 统一错误处理
//!
//! 将下层存储错误与各处理器的业务失败统一映射到 HTTP 状态码与 JSON 响应体。
//! 400 / 401 / 403 / 404 在本系统中是三类互不混淆的失败：
//! 载荷非法、未认证、已认证但无权限、资源不存在（或被归属规则隐藏）。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::DetailResponse;
use kabu_core::store::error::StoreError;

/// # Summary
/// 按字段聚合的校验错误集合，序列化为 `{"field": ["message", ...]}`。
/// 凭据类失败约定使用 `detail` 作为字段名。
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// 追加一条字段错误。
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// 构建只含一条错误的集合。
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 认证失败 (401)
    #[error("认证失败: {0}")]
    Unauthorized(String),

    /// 权限不足 (403)
    #[error("权限不足: {0}")]
    Forbidden(String),

    /// 资源未找到 (404)
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 请求参数错误 (400)
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 载荷字段校验失败 (400，按字段返回)
    #[error("载荷字段校验失败")]
    Validation(FieldErrors),

    /// 下层业务错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(fields) => {
                // 字段错误按序列化器惯例直接以字段为键返回
                return (StatusCode::BAD_REQUEST, Json(fields)).into_response();
            }
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("内部服务错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        };

        let body = Json(DetailResponse::from_msg(message));
        (status, body).into_response()
    }
}

/// 从 `StoreError` 转换
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Not found.".to_string()),
            StoreError::Conflict(msg) => ApiError::BadRequest(msg),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
