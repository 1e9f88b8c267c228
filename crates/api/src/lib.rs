//! # `kabu-api` - HTTP API 网关
//!
//! 本 crate 是 Kabu 券商台账系统的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收来自客户端的 HTTP 请求
//! - 按静态授权表将请求分发至 公开 / 会话 / 管理员 路由组
//! - 在处理器内完成载荷校验后调用 `kabu-core` 的存储端口
//! - 将领域模型转换为 DTO 返回给前端

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;
