//! # `kabu-core` - 领域核心
//!
//! 本 crate 定义券商台账系统的领域模型与存储端口 (Port)。
//! 不包含任何 I/O 实现：SQLite 适配器位于 `kabu-store`，
//! HTTP 表现层位于 `kabu-api`。
//!
//! ## 领域划分
//! - `identity` - 用户账户（用户名、邮箱、密码哈希、角色）
//! - `catalog`  - 股票目录（名称与当前定价）
//! - `ledger`   - 订单台账（只追加的买卖记录）与投资额计算
//! - `store`    - 各端口共享的存储层错误类型
//! - `config`   - 全局应用配置

pub mod catalog;
pub mod config;
pub mod identity;
pub mod ledger;
pub mod store;
