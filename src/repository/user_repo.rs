// ==========================================
// 门店日结系统 - 用户账户仓储
// ==========================================
// 职责: 管理 user_account 表（身份解析接口面）
// 说明: 认证/授权在外部系统,这里只承担“文件名 → 用户”的查找
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::UserAccount;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// UserAccountRepository
// ==========================================
pub struct UserAccountRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserAccountRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    pub fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_account (
              user_id TEXT PRIMARY KEY,
              username TEXT NOT NULL UNIQUE COLLATE NOCASE,
              display_name TEXT,
              is_active INTEGER NOT NULL DEFAULT 1,
              created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// 插入账户（用户名冲突按唯一约束报错）
    pub fn insert(&self, account: &UserAccount) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO user_account (user_id, username, display_name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                account.user_id,
                account.username,
                account.display_name,
                account.is_active as i32,
                account.created_at,
            ],
        )?;
        Ok(())
    }

    /// 按用户名查找（大小写不敏感）
    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserAccount>> {
        let conn = self.get_conn()?;
        Self::find_by_username_on(&conn, username)
    }

    /// 事务内按用户名查找（大小写不敏感）
    pub fn find_by_username_tx(
        tx: &Transaction,
        username: &str,
    ) -> RepositoryResult<Option<UserAccount>> {
        Self::find_by_username_on(tx, username)
    }

    fn find_by_username_on(
        conn: &Connection,
        username: &str,
    ) -> RepositoryResult<Option<UserAccount>> {
        let account = conn
            .query_row(
                r#"
                SELECT user_id, username, display_name, is_active, created_at
                FROM user_account
                WHERE username = ?1 COLLATE NOCASE
                "#,
                params![username],
                map_user_row,
            )
            .optional()?;
        Ok(account)
    }

    /// 全部在职账户
    pub fn list_active(&self) -> RepositoryResult<Vec<UserAccount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, username, display_name, is_active, created_at
            FROM user_account
            WHERE is_active = 1
            ORDER BY username
            "#,
        )?;

        let accounts = stmt
            .query_map([], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}

/// 行映射: user_account → UserAccount
fn map_user_row(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    Ok(UserAccount {
        user_id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        created_at: row.get(4)?,
    })
}
