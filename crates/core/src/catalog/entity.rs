use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 股票名称允许的最大长度（字符数）
pub const STOCK_NAME_MAX_LEN: usize = 50;

/// # Summary
/// 股票的系统内唯一标识（数据库代理主键）。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct StockId(pub i64);

/// # Summary
/// 股票目录条目，保存名称与当前定价。
///
/// # Invariants
/// - `name` 非空且不超过 [`STOCK_NAME_MAX_LEN`] 个字符。
/// - `price` 非负，整数部分至多 6 位、小数部分至多 2 位（定点 8,2）。
/// - 价格只能整体替换，目录内不保留历史价格。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    // 代理主键
    pub id: StockId,
    // 股票名称
    pub name: String,
    // 当前价格
    pub price: Decimal,
}

/// # Summary
/// 待插入的目录条目。`id` 由存储层在持久化时分配。
#[derive(Debug, Clone)]
pub struct NewStock {
    pub name: String,
    pub price: Decimal,
}
