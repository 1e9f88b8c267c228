//! # 投资总额路由控制器
//!
//! 只读投影：按 (owner, stock) 汇总台账中的订单，
//! 用股票的当前价格逐单累加，每次查询即时重算、不持久化。

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, FieldErrors};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::server::AppState;
use crate::types::TotalInvestedResponse;
use kabu_core::catalog::entity::StockId;
use kabu_core::identity::entity::UserId;
use kabu_core::ledger::invested::total_invested;

/// 投资总额查询请求体
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TotalInvestedRequest {
    /// 归属用户主键（必须等于当前认证用户）
    #[schema(example = 1)]
    pub owner: Option<i64>,
    /// 股票主键
    #[schema(example = 1)]
    pub stock: Option<i64>,
}

/// 查询投资总额
///
/// 投资额与订单一样按归属隔离：载荷校验通过后，
/// `owner` 不是当前用户即返回 403。
#[utoipa::path(
    post,
    path = "/total-invested/",
    tag = "投资统计 (Invested)",
    security(("bearer_jwt" = [])),
    request_body = TotalInvestedRequest,
    responses(
        (status = 200, description = "按当前价格计算的投资总额", body = TotalInvestedResponse),
        (status = 400, description = "字段校验失败"),
        (status = 401, description = "未认证"),
        (status = 403, description = "查询他人的投资总额")
    )
)]
pub async fn query_total_invested(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<TotalInvestedRequest>,
) -> Result<Json<TotalInvestedResponse>, ApiError> {
    let mut errors = FieldErrors::default();

    let owner_user = match req.owner {
        None => {
            errors.add("owner", "This field is required.");
            None
        }
        Some(pk) => {
            let found = state
                .user_store
                .get_user(UserId(pk))
                .await
                .map_err(|e| ApiError::Internal(format!("DB Error: {}", e)))?;
            if found.is_none() {
                errors.add("owner", format!("Invalid pk \"{}\" - object does not exist.", pk));
            }
            found
        }
    };
    let stock = match req.stock {
        None => {
            errors.add("stock", "This field is required.");
            None
        }
        Some(pk) => {
            let found = state
                .stock_store
                .get_stock(StockId(pk))
                .await
                .map_err(|e| ApiError::Internal(format!("DB Error: {}", e)))?;
            if found.is_none() {
                errors.add("stock", format!("Invalid pk \"{}\" - object does not exist.", pk));
            }
            found
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let (Some(owner_user), Some(stock)) = (owner_user, stock) else {
        return Err(ApiError::Internal("Validation passed with missing fields".into()));
    };

    if owner_user.id != user.id {
        return Err(ApiError::Forbidden(
            "Unable to query investments for other users".into(),
        ));
    }

    let orders = state
        .order_store
        .list_orders_for_stock(owner_user.id, stock.id)
        .await?;
    let total = total_invested(&orders, stock.price);

    Ok(Json(TotalInvestedResponse::new(
        owner_user.id.0,
        stock.id.0,
        total,
    )))
}
