//! # `kabu-store` - SQLite 存储适配器
//!
//! 在单一的 SQLite 数据库 (`broker.db`) 上实现 `kabu-core`
//! 定义的各存储端口：用户、股票目录与订单台账。

pub mod broker;
pub mod config;
