use crate::catalog::entity::StockId;
use crate::identity::entity::UserId;
use serde::{Deserialize, Serialize};

/// # Summary
/// 订单的系统内唯一标识（数据库代理主键）。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct OrderId(pub i64);

/// # Summary
/// 订单的交易方向定义。线上契约使用小整数编码：1 = 买入，2 = 卖出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// 买入
    Buy,
    /// 卖出
    Sell,
}

impl OrderSide {
    /// 线上契约使用的整数编码。
    pub fn code(self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => 2,
        }
    }

    /// 从整数编码还原方向，非法编码返回 `None`。
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(OrderSide::Buy),
            2 => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

/// # Summary
/// 台账中的一条订单记录：某用户在创建时刻对某股票的一笔买入或卖出。
///
/// # Invariants
/// - `quantity` 非负。
/// - 记录创建后不可变，台账只追加、不回撤；订单不快照创建时的价格。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // 代理主键
    pub id: OrderId,
    // 归属用户
    pub owner: UserId,
    // 交易标的
    pub stock: StockId,
    // 买卖方向
    pub side: OrderSide,
    // 委托数量
    pub quantity: i64,
}

/// # Summary
/// 待插入的订单记录。`id` 由存储层在持久化时分配。
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner: UserId,
    pub stock: StockId,
    pub side: OrderSide,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_codes() {
        assert_eq!(OrderSide::Buy.code(), 1);
        assert_eq!(OrderSide::Sell.code(), 2);
        assert_eq!(OrderSide::from_code(1), Some(OrderSide::Buy));
        assert_eq!(OrderSide::from_code(2), Some(OrderSide::Sell));
        assert_eq!(OrderSide::from_code(0), None);
        assert_eq!(OrderSide::from_code(3), None);
    }
}
