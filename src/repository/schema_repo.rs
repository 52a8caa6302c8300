// ==========================================
// 门店日结系统 - 结构定义仓储
// ==========================================
// 职责: 管理 close_cash_schema 表（结构注册表）
// 说明: 自然键 (workbook, sheet_name, version),结构全局共享
// 红线: Repository 不含业务逻辑,所有查询参数化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{SchemaRecord, SheetSchema};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 幂等写入的落点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 新插入一行
    Inserted,
    /// 命中自然键并被覆盖（force 策略）
    Updated,
    /// 命中自然键且保持原样（create-if-absent 策略下视作“已导入”）
    Unchanged,
}

impl UpsertOutcome {
    /// 本次是否实际写入
    pub fn wrote(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

// ==========================================
// CloseCashSchemaRepository
// ==========================================
pub struct CloseCashSchemaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CloseCashSchemaRepository {
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
            CREATE TABLE IF NOT EXISTS close_cash_schema (
              uid TEXT PRIMARY KEY,
              workbook TEXT NOT NULL,
              sheet_name TEXT NOT NULL,
              schema_json TEXT NOT NULL,
              version TEXT NOT NULL DEFAULT 'v1',
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              UNIQUE (workbook, sheet_name, version)
            );
            CREATE INDEX IF NOT EXISTS idx_close_cash_schema_sheet
              ON close_cash_schema (workbook, sheet_name);
            "#,
        )?;
        Ok(())
    }

    /// 在事务中按自然键 upsert 结构定义
    ///
    /// # 策略
    /// - force=false: 已存在则保持原样（幂等导入）
    /// - force=true: 已存在则覆盖 schema_json 并刷新 updated_at
    pub fn upsert_tx(
        tx: &Transaction,
        workbook: &str,
        sheet_name: &str,
        version: &str,
        schema: &SheetSchema,
        force: bool,
    ) -> RepositoryResult<UpsertOutcome> {
        let schema_json = serde_json::to_string(schema)?;
        let now = Utc::now();

        let exists: bool = tx
            .query_row(
                r#"
                SELECT 1 FROM close_cash_schema
                WHERE workbook = ?1 AND sheet_name = ?2 AND version = ?3
                LIMIT 1
                "#,
                params![workbook, sheet_name, version],
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
                UPDATE close_cash_schema
                SET schema_json = ?4, updated_at = ?5
                WHERE workbook = ?1 AND sheet_name = ?2 AND version = ?3
                "#,
                params![workbook, sheet_name, version, schema_json, now],
            )?;
            return Ok(UpsertOutcome::Updated);
        }

        let inserted = tx.execute(
            r#"
            INSERT INTO close_cash_schema (
                uid, workbook, sheet_name, schema_json, version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                Uuid::new_v4().to_string(),
                workbook,
                sheet_name,
                schema_json,
                version,
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
        workbook: &str,
        sheet_name: &str,
        version: &str,
    ) -> RepositoryResult<Option<SchemaRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT uid, workbook, sheet_name, schema_json, version, created_at, updated_at
                FROM close_cash_schema
                WHERE workbook = ?1 AND sheet_name = ?2 AND version = ?3
                "#,
                params![workbook, sheet_name, version],
                map_schema_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 列出一个工作簿的全部结构定义（按表名排序）
    pub fn list_by_workbook(&self, workbook: &str) -> RepositoryResult<Vec<SchemaRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT uid, workbook, sheet_name, schema_json, version, created_at, updated_at
            FROM close_cash_schema
            WHERE workbook = ?1
            ORDER BY sheet_name
            "#,
        )?;

        let records = stmt
            .query_map(params![workbook], map_schema_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 结构定义总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM close_cash_schema", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// 行映射: close_cash_schema → SchemaRecord
fn map_schema_row(row: &Row<'_>) -> rusqlite::Result<SchemaRecord> {
    let schema_json: String = row.get(3)?;
    let schema: SheetSchema = serde_json::from_str(&schema_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;

    Ok(SchemaRecord {
        uid: row.get(0)?,
        workbook: row.get(1)?,
        sheet_name: row.get(2)?,
        schema,
        version: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
