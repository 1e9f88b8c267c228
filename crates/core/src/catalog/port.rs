use super::entity::{NewStock, Stock, StockId};
use crate::store::error::StoreError;
use async_trait::async_trait;

/// # Summary
/// 股票目录存储接口。
///
/// # Invariants
/// - 目录是只增改不删的：接口不提供删除操作。
#[async_trait]
pub trait StockStore: Send + Sync {
    /// # Summary
    /// 插入新的目录条目并返回带有已分配 ID 的完整实体。
    async fn insert_stock(&self, stock: &NewStock) -> Result<Stock, StoreError>;

    /// # Summary
    /// 按主键获取股票。
    ///
    /// # Returns
    /// 存在返回 `Some(Stock)`，否则返回 `None`。
    async fn get_stock(&self, id: StockId) -> Result<Option<Stock>, StoreError>;

    /// # Summary
    /// 列出目录条目。
    ///
    /// # Logic
    /// `search` 为 `Some` 时按名称做大小写敏感的子串过滤，
    /// 否则返回全部条目；均按主键升序。
    ///
    /// # Arguments
    /// * `search`: 可选的子串过滤关键字。
    async fn list_stocks(&self, search: Option<&str>) -> Result<Vec<Stock>, StoreError>;
}
