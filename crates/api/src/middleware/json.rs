//! # JSON 请求体提取器
//!
//! axum 内建的 `Json` 提取器在反序列化失败时返回 422，
//! 而本系统的线上契约要求畸形载荷统一返回 400。
//! `ApiJson` 包装内建提取器并把拒绝映射为 `ApiError::BadRequest`。

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// 反序列化失败返回 400 `{"detail": "JSON parse error: ..."}` 的 Json 提取器
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(format!(
                "JSON parse error: {}",
                rejection.body_text()
            ))),
        }
    }
}
