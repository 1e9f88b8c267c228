//! # 订单台账路由控制器
//!
//! 台账只追加：创建后订单不可修改、不可删除。
//! 所有读取都以当前用户为隐式过滤条件：他人的订单与
//! 不存在的订单对调用方不可区分（404 隐藏存在性）。

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, FieldErrors};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::server::AppState;
use crate::types::OrderResponse;
use kabu_core::catalog::entity::StockId;
use kabu_core::identity::entity::UserId;
use kabu_core::ledger::entity::{NewOrder, OrderId, OrderSide};

/// 创建订单请求体
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderPayload {
    /// 归属用户主键（必须等于当前认证用户）
    #[schema(example = 1)]
    pub owner: Option<i64>,
    /// 股票主键
    #[schema(example = 1)]
    pub stock: Option<i64>,
    /// 方向编码 (1 = BUY, 2 = SELL)
    #[serde(rename = "type")]
    #[schema(example = 1)]
    pub side: Option<i64>,
    /// 委托数量（非负，缺省为 0）
    #[serde(default)]
    #[schema(example = 100)]
    pub quantity: i64,
}

/// 创建订单
///
/// 载荷校验先于归属检查执行：字段非法时返回 400 且不评估归属；
/// 字段全部合法但 `owner` 不是当前用户时返回 403。
/// 不做持仓或余额检查：台账记录的是事实，不是复式账。
#[utoipa::path(
    post,
    path = "/orders/",
    tag = "订单台账 (Orders)",
    security(("bearer_jwt" = [])),
    request_body = OrderPayload,
    responses(
        (status = 201, description = "创建成功", body = OrderResponse),
        (status = 400, description = "字段校验失败"),
        (status = 401, description = "未认证"),
        (status = 403, description = "尝试为他人创建订单")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<OrderPayload>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let mut errors = FieldErrors::default();

    let side = match req.side {
        None => {
            errors.add("type", "This field is required.");
            None
        }
        Some(code) => match OrderSide::from_code(code) {
            Some(side) => Some(side),
            None => {
                errors.add("type", format!("\"{}\" is not a valid choice.", code));
                None
            }
        },
    };

    if req.quantity < 0 {
        errors.add("quantity", "Ensure this value is greater than or equal to 0.");
    }

    // 关联字段校验：owner 与 stock 必须指向已存在的记录
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
    let (Some(owner_user), Some(stock), Some(side)) = (owner_user, stock, side) else {
        return Err(ApiError::Internal("Validation passed with missing fields".into()));
    };

    // 校验通过后才评估归属：只能为自己建单
    if owner_user.id != user.id {
        tracing::warn!(
            "User {} attempted to create an order for user {}",
            user.id.0,
            owner_user.id.0
        );
        return Err(ApiError::Forbidden("Unable to create orders for other users".into()));
    }

    let order = state
        .order_store
        .insert_order(&NewOrder {
            owner: owner_user.id,
            stock: stock.id,
            side,
            quantity: req.quantity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// 列出当前用户的订单
///
/// 过滤条件来自认证上下文，客户端无法指定他人。
#[utoipa::path(
    get,
    path = "/orders/",
    tag = "订单台账 (Orders)",
    security(("bearer_jwt" = [])),
    responses(
        (status = 200, description = "订单列表（仅自己的）", body = Vec<OrderResponse>),
        (status = 401, description = "未认证")
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_store.list_orders_for_owner(user.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// 获取当前用户的单个订单
#[utoipa::path(
    get,
    path = "/orders/{id}/",
    tag = "订单台账 (Orders)",
    security(("bearer_jwt" = [])),
    params(
        ("id" = i64, Path, description = "订单主键")
    ),
    responses(
        (status = 200, description = "订单详情", body = OrderResponse),
        (status = 401, description = "未认证"),
        (status = 404, description = "订单不存在或属于其他用户")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_store
        .get_order_for_owner(user.id, OrderId(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;
    Ok(Json(OrderResponse::from(order)))
}
