use super::entity::{NewOrder, Order, OrderId};
use crate::catalog::entity::StockId;
use crate::identity::entity::UserId;
use crate::store::error::StoreError;
use async_trait::async_trait;

/// # Summary
/// 订单台账存储接口。
///
/// # Invariants
/// - 台账只追加：接口不提供更新或删除操作。
/// - 所有读取均以归属用户为过滤条件，存储层从不返回他人的订单。
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// # Summary
    /// 追加一条订单记录并返回带有已分配 ID 的完整实体。
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError>;

    /// # Summary
    /// 在指定用户自己的订单中按主键查找。
    ///
    /// # Logic
    /// 他人的订单与不存在的订单都返回 `None`，调用方无法区分，
    /// 这是有意的存在性隐藏。
    async fn get_order_for_owner(
        &self,
        owner: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, StoreError>;

    /// # Summary
    /// 列出指定用户的全部订单，按主键升序。
    async fn list_orders_for_owner(&self, owner: UserId) -> Result<Vec<Order>, StoreError>;

    /// # Summary
    /// 列出指定用户在指定股票上的全部订单（投资额计算使用）。
    async fn list_orders_for_stock(
        &self,
        owner: UserId,
        stock: StockId,
    ) -> Result<Vec<Order>, StoreError>;
}
