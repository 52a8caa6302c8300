// ==========================================
// 门店日结系统 - 导入编排器
// ==========================================
// 职责: 批量走目录 → 探测 → 取值 → 身份解析 → upsert
// 约束: 一次调用一个事务; 仓储错误整体回滚,
//       单个文件读不动只隔离跳过,不拖垮批次
// 红线: create-if-absent 策略下重复导入不产生任何新行（幂等）
// ==========================================
// 注: 单线程阻塞批处理,无内部并行、无超时取消
// ==========================================

use crate::config::DetectionConfig;
use crate::domain::{CellValue, CloseCashEntry, SOURCE_VERSION};
use crate::engine::date_parser::try_parse_date;
use crate::engine::schema_detector::SchemaDetector;
use crate::engine::value_extractor::{extract_record, record_to_json};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::identity::resolve_workbook_owner;
use crate::importer::workbook_files::list_employee_workbooks;
use crate::importer::workbook_parser::read_workbook;
use crate::repository::{
    CloseCashEntryRepository, CloseCashSchemaRepository, MasterSnapshotRepository,
    RepositoryError, UserAccountRepository,
};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// 导入选项（命令行参数的内存形态）
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 只导入指定文件名（如 Ahmad.xlsx）; None 表示全部
    pub workbook: Option<String>,
    /// true → force-overwrite; false → create-if-absent（默认,幂等）
    pub force: bool,
}

/// 被跳过的文件与原因
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

/// 一次批处理的汇总报告
#[derive(Debug, Default)]
pub struct ImportReport {
    pub files_processed: usize,     // 成功解析的工作簿数
    pub files_skipped: usize,       // 读不动被隔离跳过的工作簿数
    pub sheets_seen: usize,         // 扫过的工作表总数
    pub schemas_written: usize,     // 实际写入（插入/覆盖）的结构数
    pub entries_written: usize,     // 实际写入（插入/覆盖）的条目数
    pub sheets_imported: usize,     // 完成条目归属的工作表数
    pub skipped: Vec<SkippedFile>,  // 跳过明细（含无归属用户的工作簿）
}

// ==========================================
// ImportOrchestrator - 导入编排器
// ==========================================
pub struct ImportOrchestrator {
    conn: Arc<Mutex<Connection>>,
    directory: PathBuf,
    detector: SchemaDetector,
}

impl ImportOrchestrator {
    /// 创建编排器并确保全部表就绪
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        directory: PathBuf,
        config: DetectionConfig,
    ) -> Result<Self, RepositoryError> {
        // 各仓储的 ensure_table 在 from_connection 里执行
        UserAccountRepository::from_connection(conn.clone())?;
        CloseCashSchemaRepository::from_connection(conn.clone())?;
        CloseCashEntryRepository::from_connection(conn.clone())?;
        MasterSnapshotRepository::from_connection(conn.clone())?;

        Ok(Self {
            conn,
            directory,
            detector: SchemaDetector::new(config),
        })
    }

    /// 执行一次批量导入
    ///
    /// # 流程（每张表）
    /// 1. SchemaDetector 探测结构 → 按 (workbook, sheet_name, version) upsert
    /// 2. ValueExtractor 取记录
    /// 3. 业务日期回退: 表名 → 首个日期值 → 当天
    /// 4. 归属用户存在才写条目,否则只留结构
    pub fn run(&self, options: &ImportOptions) -> ImportResult<ImportReport> {
        let mut report = ImportReport::default();

        let mut workbooks = list_employee_workbooks(&self.directory)?;
        if let Some(target) = &options.workbook {
            workbooks.retain(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy() == target.as_str())
                    .unwrap_or(false)
            });
            if workbooks.is_empty() {
                warn!(workbook = %target, "未找到指定工作簿");
                return Ok(report);
            }
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for path in &workbooks {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            info!(workbook = %filename, "正在处理工作簿");

            // 单文件解析失败只隔离,不中止批次、不回滚事务
            let parsed = match read_workbook(path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(workbook = %filename, error = %e, "工作簿读取失败,跳过");
                    report.files_skipped += 1;
                    report.skipped.push(SkippedFile {
                        filename,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let owner = resolve_workbook_owner(&tx, &filename)?;
            if owner.is_none() {
                warn!(workbook = %filename, "没有匹配的用户,本簿只入库结构、跳过条目");
                report.skipped.push(SkippedFile {
                    filename: filename.clone(),
                    reason: "无匹配用户".to_string(),
                });
            }

            for (sheet_name, grid) in &parsed.sheets {
                report.sheets_seen += 1;

                let schema = self.detector.detect(grid);
                let record = extract_record(grid, &schema);

                let outcome = CloseCashSchemaRepository::upsert_tx(
                    &tx,
                    &filename,
                    sheet_name,
                    SOURCE_VERSION,
                    &schema,
                    options.force,
                )?;
                if outcome.wrote() {
                    report.schemas_written += 1;
                }

                let Some(user) = &owner else {
                    continue;
                };

                let entry_date = resolve_entry_date(sheet_name, &record)
                    .unwrap_or_else(|| chrono::Local::now().naive_local().date());

                let now = Utc::now();
                let entry = CloseCashEntry {
                    uid: Uuid::new_v4().to_string(),
                    user_id: user.user_id.clone(),
                    workbook: filename.clone(),
                    sheet_name: sheet_name.clone(),
                    entry_date,
                    data: record_to_json(&record),
                    source_version: SOURCE_VERSION.to_string(),
                    created_at: now,
                    updated_at: now,
                };

                let outcome = CloseCashEntryRepository::upsert_tx(&tx, &entry, options.force)?;
                if outcome.wrote() {
                    report.entries_written += 1;
                }
                report.sheets_imported += 1;
            }

            report.files_processed += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
            .map_err(ImportError::from)?;

        info!(
            files = report.files_processed,
            skipped = report.files_skipped,
            sheets = report.sheets_imported,
            schemas = report.schemas_written,
            entries = report.entries_written,
            "批量导入完成"
        );
        Ok(report)
    }
}

/// 业务日期三级回退
///
/// 1. 表名本身是日期（"2025-10-23" 这类表名优先,与 Date 字段值无关）
/// 2. 记录里第一个日期值/可解析为日期的文本（按字段声明顺序扫描）
/// 3. 都没有 → None,调用方落到“当天”,保证日期永不为空
pub fn resolve_entry_date(sheet_name: &str, record: &[(String, CellValue)]) -> Option<NaiveDate> {
    if let Some(date) = try_parse_date(sheet_name) {
        return Some(date);
    }

    for (_key, value) in record {
        match value {
            CellValue::DateTime(dt) => return Some(dt.date()),
            CellValue::Text(s) => {
                if let Some(date) = try_parse_date(s) {
                    return Some(date);
                }
            }
            _ => {}
        }
    }

    None
}
