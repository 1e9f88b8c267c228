use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kabu_core::catalog::entity::{NewStock, Stock, StockId};
use kabu_core::catalog::port::StockStore;
use kabu_core::identity::entity::{NewUser, User, UserId, UserRole};
use kabu_core::identity::port::UserStore;
use kabu_core::ledger::entity::{NewOrder, Order, OrderId, OrderSide};
use kabu_core::ledger::port::OrderStore;
use kabu_core::store::error::StoreError;
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::fs;
use std::str::FromStr;

/// 默认数据库文件名
const DEFAULT_BROKER_DB: &str = "broker.db";

/// 用户行：id, username, email, password_hash, role, created_at
type UserRow = (i64, String, String, String, String, DateTime<Utc>);

/// 订单行：id, owner, stock, side, quantity
type OrderRow = (i64, i64, i64, i64, i64);

/// # Summary
/// 三个存储端口（用户 / 目录 / 台账）的 SQLite 统一实现。
/// 所有表都位于中心化的 `broker.db` 中，通过共享连接池访问。
///
/// # Invariants
/// * 数据库结构在存储实例创建时初始化。
/// * 外键约束在连接级别开启，父记录删除时由 SQLite 级联。
/// * 价格以 TEXT 形式持久化，读取时还原为定点十进制。
pub struct SqliteBrokerStore {
    pool: SqlitePool,
}

impl SqliteBrokerStore {
    /// 创建新的 SqliteBrokerStore 并初始化表结构。
    ///
    /// # Logic
    /// 1. 获取配置的数据根目录并确保其存在。
    /// 2. 配置 SQLite 连接选项：`create_if_missing`、WAL 日志、
    ///    外键约束与繁忙等待。
    /// 3. 连接到数据库并执行 DDL 初始化表结构。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例 or 数据库错误。
    pub async fn new() -> Result<Self, StoreError> {
        let root = crate::config::get_root_dir();
        fs::create_dir_all(&root).map_err(|e| StoreError::InitError(e.to_string()))?;

        let db_path = root.join(DEFAULT_BROKER_DB);
        tracing::info!("Opening broker database at {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(10))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                stock INTEGER NOT NULL REFERENCES stocks(id) ON DELETE CASCADE,
                side INTEGER NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_orders_owner_stock ON orders (owner, stock);
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 将 sqlx 写入错误映射为存储层错误，唯一性冲突单独归类。
    fn map_write_err(e: sqlx::Error) -> StoreError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.to_string());
            }
        }
        StoreError::Database(e.to_string())
    }

    fn user_from_row(row: UserRow) -> Result<User, StoreError> {
        let role = UserRole::from_str(&row.4).map_err(StoreError::Unknown)?;
        Ok(User {
            id: UserId(row.0),
            username: row.1,
            email: row.2,
            password_hash: row.3,
            role,
            created_at: row.5,
        })
    }

    fn stock_from_row(row: (i64, String, String)) -> Result<Stock, StoreError> {
        let price = Decimal::from_str(&row.2)
            .map_err(|e| StoreError::Unknown(format!("Bad price literal '{}': {}", row.2, e)))?;
        Ok(Stock {
            id: StockId(row.0),
            name: row.1,
            price,
        })
    }

    fn order_from_row(row: OrderRow) -> Result<Order, StoreError> {
        let side = OrderSide::from_code(row.3)
            .ok_or_else(|| StoreError::Unknown(format!("Bad order side code {}", row.3)))?;
        Ok(Order {
            id: OrderId(row.0),
            owner: UserId(row.1),
            stock: StockId(row.2),
            side,
            quantity: row.4,
        })
    }
}

#[async_trait]
impl UserStore for SqliteBrokerStore {
    /// # Summary
    /// 插入新用户，返回带已分配主键的实体。
    ///
    /// # Logic
    /// 唯一性由 `users` 表的 UNIQUE 约束兜底；
    /// 违反时映射为 `StoreError::Conflict`。
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_err)?;

        Ok(User {
            id: UserId(result.last_insert_rowid()),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: user.created_at,
        })
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .map(Self::user_from_row)
        .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .map(Self::user_from_row)
        .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .map(Self::user_from_row)
        .transpose()
    }
}

#[async_trait]
impl StockStore for SqliteBrokerStore {
    async fn insert_stock(&self, stock: &NewStock) -> Result<Stock, StoreError> {
        let result = sqlx::query("INSERT INTO stocks (name, price) VALUES (?, ?)")
            .bind(&stock.name)
            .bind(stock.price.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::map_write_err)?;

        Ok(Stock {
            id: StockId(result.last_insert_rowid()),
            name: stock.name.clone(),
            price: stock.price,
        })
    }

    async fn get_stock(&self, id: StockId) -> Result<Option<Stock>, StoreError> {
        sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, name, price FROM stocks WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .map(Self::stock_from_row)
        .transpose()
    }

    /// # Summary
    /// 列出目录条目，可按名称子串过滤。
    ///
    /// # Logic
    /// 子串匹配使用 `instr()` 而不是 `LIKE`：SQLite 的 `LIKE`
    /// 对 ASCII 不区分大小写，而目录契约要求大小写敏感匹配。
    async fn list_stocks(&self, search: Option<&str>) -> Result<Vec<Stock>, StoreError> {
        let rows = match search {
            Some(needle) => {
                sqlx::query_as::<_, (i64, String, String)>(
                    "SELECT id, name, price FROM stocks WHERE instr(name, ?) > 0 ORDER BY id",
                )
                .bind(needle)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (i64, String, String)>(
                    "SELECT id, name, price FROM stocks ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(Self::stock_from_row).collect()
    }
}

#[async_trait]
impl OrderStore for SqliteBrokerStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let result =
            sqlx::query("INSERT INTO orders (owner, stock, side, quantity) VALUES (?, ?, ?, ?)")
                .bind(order.owner.0)
                .bind(order.stock.0)
                .bind(order.side.code())
                .bind(order.quantity)
                .execute(&self.pool)
                .await
                .map_err(Self::map_write_err)?;

        Ok(Order {
            id: OrderId(result.last_insert_rowid()),
            owner: order.owner,
            stock: order.stock,
            side: order.side,
            quantity: order.quantity,
        })
    }

    /// # Summary
    /// 在归属用户自己的订单中按主键查找。
    ///
    /// # Logic
    /// WHERE 子句同时绑定主键与归属者，他人的订单因此与
    /// 不存在的订单同样表现为 `None`。
    async fn get_order_for_owner(
        &self,
        owner: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>(
            "SELECT id, owner, stock, side, quantity FROM orders WHERE id = ? AND owner = ?",
        )
        .bind(id.0)
        .bind(owner.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .map(Self::order_from_row)
        .transpose()
    }

    async fn list_orders_for_owner(&self, owner: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, owner, stock, side, quantity FROM orders WHERE owner = ? ORDER BY id",
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(Self::order_from_row).collect()
    }

    async fn list_orders_for_stock(
        &self,
        owner: UserId,
        stock: StockId,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, owner, stock, side, quantity FROM orders WHERE owner = ? AND stock = ? ORDER BY id",
        )
        .bind(owner.0)
        .bind(stock.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(Self::order_from_row).collect()
    }
}
