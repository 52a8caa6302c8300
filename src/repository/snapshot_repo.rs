// ==========================================
// 门店日结系统 - 主表快照仓储
// ==========================================
// 职责: 管理 a2z_snapshot 表（审计时间线）
// 红线: 只追加,无 UPDATE 路径; 读取一律按 snapshot_at 倒序
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::MasterSnapshot;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// MasterSnapshotRepository
// ==========================================
pub struct MasterSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MasterSnapshotRepository {
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
            CREATE TABLE IF NOT EXISTS a2z_snapshot (
              uid TEXT PRIMARY KEY,
              snapshot_at TEXT NOT NULL DEFAULT (datetime('now')),
              data_json TEXT NOT NULL,
              note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_a2z_snapshot_at
              ON a2z_snapshot (snapshot_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 追加一条快照,返回生成的记录
    pub fn append(
        &self,
        data: &serde_json::Value,
        note: Option<&str>,
    ) -> RepositoryResult<MasterSnapshot> {
        let snapshot = MasterSnapshot {
            uid: Uuid::new_v4().to_string(),
            snapshot_at: Utc::now(),
            data: data.clone(),
            note: note.map(|s| s.to_string()),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO a2z_snapshot (uid, snapshot_at, data_json, note)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                snapshot.uid,
                snapshot.snapshot_at,
                serde_json::to_string(&snapshot.data)?,
                snapshot.note,
            ],
        )?;

        Ok(snapshot)
    }

    /// 最近 N 条快照（倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<MasterSnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT uid, snapshot_at, data_json, note
            FROM a2z_snapshot
            ORDER BY snapshot_at DESC
            LIMIT ?1
            "#,
        )?;

        let snapshots = stmt
            .query_map(params![limit as i64], map_snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    /// 快照总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM a2z_snapshot", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// 行映射: a2z_snapshot → MasterSnapshot
fn map_snapshot_row(row: &Row<'_>) -> rusqlite::Result<MasterSnapshot> {
    let data_json: String = row.get(2)?;
    let data: serde_json::Value = serde_json::from_str(&data_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;

    Ok(MasterSnapshot {
        uid: row.get(0)?,
        snapshot_at: row.get(1)?,
        data,
        note: row.get(3)?,
    })
}
