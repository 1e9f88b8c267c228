use super::entity::Order;
use rust_decimal::Decimal;

/// # Summary
/// 计算一组订单在给定现价下占用的总资金：Σ quantity × price。
///
/// # Logic
/// 1. 调用方预先按 (owner, stock) 过滤好订单列表。
/// 2. 用股票的**当前**价格逐单累加，订单不快照历史价格。
/// 3. 买入与卖出方向同样计入总额。
///
/// # Arguments
/// * `orders`: 已按 (owner, stock) 过滤的订单切片。
/// * `price`: 该股票的当前价格。
///
/// # Returns
/// 定点十进制总额；订单为空时为 0。
pub fn total_invested(orders: &[Order], price: Decimal) -> Decimal {
    orders
        .iter()
        .fold(Decimal::ZERO, |acc, order| {
            acc + Decimal::from(order.quantity) * price
        })
}
