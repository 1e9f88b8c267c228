use std::path::PathBuf;
use std::sync::Arc;

use kabu_api::server::{start_server, AppState};
use kabu_core::config::{AppConfig, ServerConfig};
use kabu_core::identity::entity::{NewUser, UserRole};
use kabu_core::identity::port::UserStore;
use kabu_store::broker::SqliteBrokerStore;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为基底。
/// 2. 叠加可选的 `kabu.toml` 配置文件。
/// 3. 叠加 `KABU_` 前缀的环境变量（嵌套键用 `__` 分隔，
///    例如 `KABU_SERVER__PORT=9000`）。
fn load_config() -> AppConfig {
    let loaded = config::Config::builder()
        .add_source(config::File::with_name("kabu").required(false))
        .add_source(config::Environment::with_prefix("KABU").separator("__"))
        .build()
        .and_then(|c| c.try_deserialize::<AppConfig>());

    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            // 日志尚未初始化，降级到 stderr
            eprintln!("Failed to load config, falling back to defaults: {}", e);
            AppConfig::default()
        }
    }
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化具体的存储实现并通过 Arc<dyn Trait> 注入到 API 层。
///
/// # Logic
/// 1. 加载配置并初始化全局日志。
/// 2. 实例化 SQLite 存储适配器。
/// 3. 引导 admin 账户（目录维护仅限管理员，公开接口永远产生不了管理员）。
/// 4. 组装应用状态并启动 HTTP 服务。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载配置
    let cfg = load_config();

    // 2. 初始化全局日志：stdout + 数据目录下按天滚动的日志文件
    std::fs::create_dir_all(&cfg.database.data_dir)?;
    let file_appender = tracing_appender::rolling::daily(&cfg.database.data_dir, "kabu.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(file_writer.and(std::io::stdout))
        .init();
    info!("Kabu broker backend starting...");

    // 3. 实例化存储层
    kabu_store::config::set_root_dir(PathBuf::from(&cfg.database.data_dir));
    let broker = Arc::new(SqliteBrokerStore::new().await?);

    // 4. 引导 admin 账户
    if broker.find_user_by_username("admin").await?.is_none() {
        let password_hash = bcrypt::hash(&cfg.server.admin_password, bcrypt::DEFAULT_COST)?;
        broker
            .insert_user(&NewUser {
                username: "admin".to_string(),
                email: "admin@kabu.local".to_string(),
                password_hash,
                role: UserRole::Admin,
                created_at: chrono::Utc::now(),
            })
            .await?;
        info!("Bootstrap admin account created");
        if cfg.server.admin_password == ServerConfig::default().admin_password {
            warn!("Bootstrap admin uses the default password, override server.admin_password");
        }
    }

    // 5. 组装应用状态并启动 HTTP 服务
    let bind_addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let state = AppState {
        user_store: broker.clone(),
        stock_store: broker.clone(),
        order_store: broker,
        app_config: Arc::new(cfg),
    };

    start_server(state, &bind_addr).await
}
