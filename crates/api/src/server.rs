//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。
//!
//! 授权表在这里静态成型：三个路由组分别对应 匿名 / 会话 / 管理员
//! 三类主体，中间件层在任何处理器执行之前完成判定。

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kabu_core::catalog::port::StockStore;
use kabu_core::config::AppConfig;
use kabu_core::identity::port::UserStore;
use kabu_core::ledger::port::OrderStore;

use crate::routes::{auth, invested, orders, stocks};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 各存储端口在服务启动前由 DI 容器注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// 用户存储端口 (鉴权验证与账户管理)
    pub user_store: Arc<dyn UserStore>,
    /// 股票目录存储端口
    pub stock_store: Arc<dyn StockStore>,
    /// 订单台账存储端口
    pub order_store: Arc<dyn OrderStore>,
    /// 应用配置 (JWT 密钥等)
    pub app_config: Arc<AppConfig>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kabu 券商台账 API",
        version = "0.1.0",
        description = "Kabu 券商台账系统的 RESTful API。提供账户注册登录、股票目录、订单台账与投资总额查询功能。",
        license(name = "MIT")
    ),
    tags(
        (name = "鉴权 (Auth)", description = "注册、登录、注销等认证相关 API"),
        (name = "股票目录 (Stocks)", description = "股票目录的创建（仅管理员）与公开查询"),
        (name = "订单台账 (Orders)", description = "只追加的订单创建与查询（按归属隔离）"),
        (name = "投资统计 (Invested)", description = "按当前价格汇总的投资总额查询")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// 为 OpenAPI 文档注入全局 Bearer JWT 鉴权方案。
///
/// 注册后，Swagger UI 页面顶部将显示 🔒 Authorize 按钮，
/// 用户可以填入 JWT Token 后对所有标记了 `security` 的接口进行鉴权测试。
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // 若 components 不存在则创建
        let components = openapi.components.get_or_insert_with(Default::default);

        // 注册名为 "bearer_jwt" 的 HTTP Bearer 鉴权方案
        components.add_security_scheme(
            "bearer_jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "在此处填入登录接口返回的 JWT Token（无需 'Bearer ' 前缀）",
                    ))
                    .build(),
            ),
        );
    }
}

// ============================================================
//  路由组装与服务启动
// ============================================================

/// 构建完整的 axum 应用路由树。
///
/// 拆分为独立函数以便集成测试将其绑定到任意监听器上，
/// 而不必复制路由表。
///
/// # Logic
/// 1. 无需鉴权的公开路由（注册、登录、目录查询）。
/// 2. 只需要合法 JWT 鉴权的会话路由（注销、订单、投资统计）。
/// 3. 需要 Admin 角色鉴权的路由（目录条目创建）。
/// 4. 合并所有路由、自动收集 OpenAPI Doc、挂载 Swagger UI 与 CORS。
pub fn build_router(state: AppState) -> Router {
    // 1. 无需鉴权的公开路由
    let public_router = OpenApiRouter::new()
        .routes(routes!(auth::sign_up))
        .routes(routes!(auth::login))
        .routes(routes!(stocks::list_stocks))
        .routes(routes!(stocks::get_stock));

    // 2. 只需要合法 JWT 鉴权的路由 (普通用户)
    let session_router = OpenApiRouter::new()
        .routes(routes!(auth::logout))
        .routes(routes!(orders::create_order))
        .routes(routes!(orders::list_orders))
        .routes(routes!(orders::get_order))
        .routes(routes!(invested::query_total_invested))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // 3. 需要 Admin 角色鉴权的路由
    let admin_router = OpenApiRouter::new()
        .routes(routes!(stocks::create_stock))
        .layer(axum::middleware::from_fn(
            crate::middleware::auth::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // 4. 合并所有路由与自动收集的 OpenAPI Doc
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(public_router)
        .merge(session_router)
        .merge(admin_router)
        .with_state(state)
        .split_for_parts();

    // 5. 配置 CORS (开发阶段允许所有来源)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 绑定 TCP 端口并启动 HTTP 监听。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    tracing::info!("🚀 Kabu API Server listening on {}", bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/swagger-ui/", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
