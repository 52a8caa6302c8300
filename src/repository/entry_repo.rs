// ==========================================
// 门店日结系统 - 日结条目仓储
// ==========================================
// 职责: 管理 close_cash_entry 表
// 说明: 自然键 (user_id, workbook, sheet_name, entry_date, source_version)
// 红线: 导入路径只 upsert,删除仅限管理员显式操作
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::CloseCashEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schema_repo::UpsertOutcome;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// CloseCashEntryRepository
// ==========================================
pub struct CloseCashEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CloseCashEntryRepository {
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
            CREATE TABLE IF NOT EXISTS close_cash_entry (
              uid TEXT PRIMARY KEY,
              user_id TEXT NOT NULL REFERENCES user_account (user_id) ON DELETE CASCADE,
              workbook TEXT NOT NULL,
              sheet_name TEXT NOT NULL,
              entry_date TEXT NOT NULL,
              data_json TEXT NOT NULL,
              source_version TEXT NOT NULL DEFAULT 'v1',
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              UNIQUE (user_id, workbook, sheet_name, entry_date, source_version)
            );
            CREATE INDEX IF NOT EXISTS idx_close_cash_entry_user_date
              ON close_cash_entry (user_id, entry_date);
            CREATE INDEX IF NOT EXISTS idx_close_cash_entry_sheet
              ON close_cash_entry (workbook, sheet_name);
            "#,
        )?;
        Ok(())
    }

    /// 在事务中按自然键 upsert 条目
    ///
    /// # 策略
    /// - force=false: 已存在视作“已导入”,原样保留（幂等）
    /// - force=true: 已存在则覆盖 data_json 并刷新 updated_at
    pub fn upsert_tx(
        tx: &Transaction,
        entry: &CloseCashEntry,
        force: bool,
    ) -> RepositoryResult<UpsertOutcome> {
        let data_json = serde_json::to_string(&entry.data)?;
        let now = Utc::now();

        let exists: bool = tx
            .query_row(
                r#"
                SELECT 1 FROM close_cash_entry
                WHERE user_id = ?1 AND workbook = ?2 AND sheet_name = ?3
                  AND entry_date = ?4 AND source_version = ?5
                LIMIT 1
                "#,
                params![
                    entry.user_id,
                    entry.workbook,
                    entry.sheet_name,
                    entry.entry_date,
                    entry.source_version,
                ],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            if !force {
                return Ok(UpsertOutcome::Unchanged);
            }
            tx.execute(
                r#"
                UPDATE close_cash_entry
                SET data_json = ?6, updated_at = ?7
                WHERE user_id = ?1 AND workbook = ?2 AND sheet_name = ?3
                  AND entry_date = ?4 AND source_version = ?5
                "#,
                params![
                    entry.user_id,
                    entry.workbook,
                    entry.sheet_name,
                    entry.entry_date,
                    entry.source_version,
                    data_json,
                    now,
                ],
            )?;
            return Ok(UpsertOutcome::Updated);
        }

        let inserted = tx.execute(
            r#"
            INSERT INTO close_cash_entry (
                uid, user_id, workbook, sheet_name, entry_date,
                data_json, source_version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                Uuid::new_v4().to_string(),
                entry.user_id,
                entry.workbook,
                entry.sheet_name,
                entry.entry_date,
                data_json,
                entry.source_version,
                now,
                now,
            ],
        );

        match inserted.map_err(RepositoryError::from) {
            Ok(_) => Ok(UpsertOutcome::Inserted),
            // 跨进程并发导入撞自然键: create-if-absent 口径下视作“已导入”
            Err(RepositoryError::UniqueConstraintViolation(_)) if !force => {
                Ok(UpsertOutcome::Unchanged)
            }
            Err(e) => Err(e),
        }
    }

    /// 按自然键读取
    pub fn get(
        &self,
        user_id: &str,
        workbook: &str,
        sheet_name: &str,
        entry_date: NaiveDate,
        source_version: &str,
    ) -> RepositoryResult<Option<CloseCashEntry>> {
        let conn = self.get_conn()?;
        let entry = conn
            .query_row(
                r#"
                SELECT uid, user_id, workbook, sheet_name, entry_date,
                       data_json, source_version, created_at, updated_at
                FROM close_cash_entry
                WHERE user_id = ?1 AND workbook = ?2 AND sheet_name = ?3
                  AND entry_date = ?4 AND source_version = ?5
                "#,
                params![user_id, workbook, sheet_name, entry_date, source_version],
                map_entry_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// 列出某用户的条目（按业务日期倒序）
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<CloseCashEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT uid, user_id, workbook, sheet_name, entry_date,
                   data_json, source_version, created_at, updated_at
            FROM close_cash_entry
            WHERE user_id = ?1
            ORDER BY entry_date DESC, sheet_name
            "#,
        )?;

        let entries = stmt
            .query_map(params![user_id], map_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 条目总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM close_cash_entry", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 管理员显式删除（导入路径不得调用）
    pub fn delete(&self, uid: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM close_cash_entry WHERE uid = ?1", params![uid])?;
        Ok(affected)
    }
}

/// 行映射: close_cash_entry → CloseCashEntry
fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<CloseCashEntry> {
    let data_json: String = row.get(5)?;
    let data: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&data_json)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(CloseCashEntry {
        uid: row.get(0)?,
        user_id: row.get(1)?,
        workbook: row.get(2)?,
        sheet_name: row.get(3)?,
        entry_date: row.get(4)?,
        data,
        source_version: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
