use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 用户的系统内唯一标识（数据库代理主键）。
///
/// # Invariants
/// - 由存储层在插入时分配，调用方不得自行构造未持久化的 ID。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// # Summary
/// 用户角色。注册接口只能产生 `Standard`，唯一的 `Admin`
/// 由应用启动时的引导流程写入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// 管理员（可维护股票目录）
    Admin,
    /// 普通用户
    Standard,
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(UserRole::Admin),
            "Standard" => Ok(UserRole::Standard),
            _ => Err(format!("Unknown UserRole: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "Admin"),
            UserRole::Standard => write!(f, "Standard"),
        }
    }
}

/// # Summary
/// 用户实体，代表系统的使用者。
///
/// # Invariants
/// - `username` 与 `email` 均全局唯一。
/// - `password_hash` 为 bcrypt 哈希，存储层永远不接触明文密码。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // 代理主键
    pub id: UserId,
    // 登录用户名
    pub username: String,
    // 邮箱地址
    pub email: String,
    // bcrypt 密码哈希
    pub password_hash: String,
    // 角色
    pub role: UserRole,
    // 注册时间
    pub created_at: DateTime<Utc>,
}

/// # Summary
/// 待插入的用户记录。`id` 由存储层在持久化时分配。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("Admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("Standard".parse::<UserRole>(), Ok(UserRole::Standard));
        assert!("root".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Admin.to_string(), "Admin");
        assert_eq!(UserRole::Standard.to_string(), "Standard");
    }
}
