//! # 股票目录路由控制器
//!
//! 目录的读取面向所有人开放；新条目只能由管理员创建
//! （`require_admin` 在路由层完成判定，处理器只负责载荷校验）。

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, FieldErrors};
use crate::middleware::json::ApiJson;
use crate::server::AppState;
use crate::types::StockResponse;
use kabu_core::catalog::entity::{NewStock, StockId, STOCK_NAME_MAX_LEN};

/// 创建目录条目请求体
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StockPayload {
    /// 股票名称（非空，至多 50 字符）
    #[schema(example = "Apple Inc.")]
    pub name: Option<String>,
    /// 价格（定点 8,2，非负；接受数字或字符串字面量）
    #[schema(example = "170.25")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockSearchQuery {
    /// 名称子串过滤（大小写敏感）
    pub search: Option<String>,
}

/// 校验定点 (8,2) 价格：至多 2 位小数、整数部分至多 6 位、非负。
fn validate_price(errors: &mut FieldErrors, price: &Option<Decimal>) -> Option<Decimal> {
    let Some(price) = price else {
        errors.add("price", "This field is required.");
        return None;
    };
    if price.scale() > 2 {
        errors.add("price", "Ensure that there are no more than 2 decimal places.");
        return None;
    }
    if price.abs() >= Decimal::from(1_000_000) {
        errors.add(
            "price",
            "Ensure that there are no more than 6 digits before the decimal point.",
        );
        return None;
    }
    if *price < Decimal::ZERO {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
        return None;
    }
    Some(*price)
}

/// 创建目录条目
///
/// 仅限 Admin 角色。价格是条目的当前定价，后续只能整体替换。
#[utoipa::path(
    post,
    path = "/stocks/",
    tag = "股票目录 (Stocks)",
    security(("bearer_jwt" = [])),
    request_body = StockPayload,
    responses(
        (status = 201, description = "创建成功", body = StockResponse),
        (status = 400, description = "名称或价格非法"),
        (status = 401, description = "未认证"),
        (status = 403, description = "非管理员")
    )
)]
pub async fn create_stock(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StockPayload>,
) -> Result<(StatusCode, Json<StockResponse>), ApiError> {
    let mut errors = FieldErrors::default();

    let name = match req.name.as_deref().map(str::trim) {
        None => {
            errors.add("name", "This field is required.");
            None
        }
        Some("") => {
            errors.add("name", "This field may not be blank.");
            None
        }
        Some(name) if name.chars().count() > STOCK_NAME_MAX_LEN => {
            errors.add(
                "name",
                format!("Ensure this field has no more than {} characters.", STOCK_NAME_MAX_LEN),
            );
            None
        }
        Some(name) => Some(name.to_string()),
    };

    let price = validate_price(&mut errors, &req.price);

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let (Some(name), Some(price)) = (name, price) else {
        return Err(ApiError::Internal("Validation passed with missing fields".into()));
    };

    let stock = state.stock_store.insert_stock(&NewStock { name, price }).await?;

    tracing::info!("Stock listed: {} (id={})", stock.name, stock.id.0);
    Ok((StatusCode::CREATED, Json(StockResponse::from(stock))))
}

/// 列出目录条目
///
/// `?search=` 提供时按名称做大小写敏感的子串过滤；空参数等同缺省。
#[utoipa::path(
    get,
    path = "/stocks/",
    tag = "股票目录 (Stocks)",
    params(
        ("search" = Option<String>, Query, description = "名称子串过滤（大小写敏感）")
    ),
    responses(
        (status = 200, description = "目录列表", body = Vec<StockResponse>)
    )
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockSearchQuery>,
) -> Result<Json<Vec<StockResponse>>, ApiError> {
    let search = query.search.as_deref().filter(|s| !s.is_empty());
    let stocks = state.stock_store.list_stocks(search).await?;
    Ok(Json(stocks.into_iter().map(StockResponse::from).collect()))
}

/// 获取单个目录条目
#[utoipa::path(
    get,
    path = "/stocks/{id}/",
    tag = "股票目录 (Stocks)",
    params(
        ("id" = i64, Path, description = "股票主键")
    ),
    responses(
        (status = 200, description = "目录条目", body = StockResponse),
        (status = 404, description = "条目不存在")
    )
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StockResponse>, ApiError> {
    let stock = state
        .stock_store
        .get_stock(StockId(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;
    Ok(Json(StockResponse::from(stock)))
}
