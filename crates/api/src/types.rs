//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。
//! 定点十进制字段（价格、投资总额）统一渲染为保留两位小数的字符串。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use kabu_core::catalog::entity::Stock;
use kabu_core::identity::entity::User;
use kabu_core::ledger::entity::Order;

/// 以两位小数渲染定点十进制值（"170.25"、"900.00"）。
fn decimal_to_string(value: Decimal) -> String {
    let mut value = value;
    value.rescale(2);
    value.to_string()
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 仅携带一条说明信息的响应体（错误详情与注销成功均使用）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    /// 说明信息
    #[schema(example = "Logout successful")]
    pub detail: String,
}

impl DetailResponse {
    /// 从说明信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self { detail: msg.into() }
    }
}

// ============================================================
//  鉴权 DTO
// ============================================================

/// 注册请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpRequest {
    /// 用户名（全局唯一）
    #[schema(example = "trader_01")]
    pub username: Option<String>,
    /// 邮箱（全局唯一）
    #[schema(example = "trader01@example.com")]
    pub email: Option<String>,
    /// 密码（至少 6 个字符）
    #[schema(example = "P@ssw0rd!")]
    pub password: Option<String>,
}

/// 用户基础信息响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// 用户主键
    #[schema(example = 1)]
    pub id: i64,
    /// 用户名
    #[schema(example = "trader_01")]
    pub username: String,
    /// 邮箱
    #[schema(example = "trader01@example.com")]
    pub email: String,
}

/// 登录请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// 用户名
    #[schema(example = "trader_01")]
    pub username: Option<String>,
    /// 密码
    #[schema(example = "P@ssw0rd!")]
    pub password: Option<String>,
}

/// 登录成功返回的 Token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// 用户名
    #[schema(example = "trader_01")]
    pub username: String,
    /// JWT Bearer Token
    #[schema(example = "eyJhbGciOiJIUzI1NiIs...")]
    pub token: String,
}

/// JWT Claims 内容 (内部使用，不暴露到 Swagger)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户主键（十进制字符串）
    pub sub: String,
    /// 角色 ("Admin" 或 "Standard")
    pub role: String,
    /// Token 过期时间 (Unix 时间戳)
    pub exp: usize,
}

// ============================================================
//  股票目录 DTO
// ============================================================

/// 目录条目 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockResponse {
    /// 股票主键
    #[schema(example = 1)]
    pub id: i64,
    /// 股票名称
    #[schema(example = "Apple Inc.")]
    pub name: String,
    /// 当前价格（两位小数）
    #[schema(example = "170.25")]
    pub price: String,
}

// ============================================================
//  订单台账 DTO
// ============================================================

/// 订单 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    /// 订单主键
    #[schema(example = 1)]
    pub id: i64,
    /// 归属用户主键
    #[schema(example = 1)]
    pub owner: i64,
    /// 股票主键
    #[schema(example = 1)]
    pub stock: i64,
    /// 方向编码 (1 = BUY, 2 = SELL)
    #[serde(rename = "type")]
    #[schema(example = 1)]
    pub side: i64,
    /// 委托数量
    #[schema(example = 100)]
    pub quantity: i64,
}

/// 投资总额查询响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TotalInvestedResponse {
    /// 归属用户主键
    #[schema(example = 1)]
    pub owner: i64,
    /// 股票主键
    #[schema(example = 1)]
    pub stock: i64,
    /// 按当前价格计算的投资总额（两位小数）
    #[schema(example = "900.00")]
    pub total_invested: String,
}

// ============================================================
//  领域模型 → DTO 惯用转换 (impl From<T>)
// ============================================================

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.0,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

impl From<Stock> for StockResponse {
    fn from(s: Stock) -> Self {
        Self {
            id: s.id.0,
            name: s.name,
            price: decimal_to_string(s.price),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.0,
            owner: o.owner.0,
            stock: o.stock.0,
            side: o.side.code(),
            quantity: o.quantity,
        }
    }
}

impl TotalInvestedResponse {
    /// 从查询参数与计算结果组装响应
    pub fn new(owner: i64, stock: i64, total: Decimal) -> Self {
        Self {
            owner,
            stock,
            total_invested: decimal_to_string(total),
        }
    }
}
