use super::entity::{NewUser, User, UserId};
use crate::store::error::StoreError;
use async_trait::async_trait;

/// # Summary
/// 用户存储接口，负责账户记录的持久化与查询。
///
/// # Invariants
/// - 实现者必须保证 `username` 与 `email` 的唯一性约束，
///   冲突时返回 `StoreError::Conflict`。
#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Summary
    /// 插入新用户并返回带有已分配 ID 的完整实体。
    ///
    /// # Logic
    /// 向 `users` 表执行 INSERT，读取代理主键后组装实体。
    ///
    /// # Arguments
    /// * `user`: 待插入的用户记录。
    ///
    /// # Returns
    /// 成功返回持久化后的 `User`，唯一性冲突返回 `StoreError::Conflict`。
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// # Summary
    /// 按主键获取用户。
    ///
    /// # Arguments
    /// * `id`: 用户主键。
    ///
    /// # Returns
    /// 存在返回 `Some(User)`，否则返回 `None`。
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// # Summary
    /// 按用户名查找用户（登录与唯一性校验使用）。
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// # Summary
    /// 按邮箱查找用户（注册时的唯一性校验使用）。
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
