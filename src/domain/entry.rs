// ==========================================
// 门店日结系统 - 日结条目与主表快照
// ==========================================
// 职责: 导入/编辑产出的持久化实体
// 红线: 导入路径只增改,不删除条目
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 结构与条目的来源版本标记（预留结构演进,当前恒为 v1）
pub const SOURCE_VERSION: &str = "v1";

// ==========================================
// CloseCashEntry - 单张工作表抽取出的一条日结记录
// ==========================================
// 自然键: (user_id, workbook, sheet_name, entry_date, source_version)
// 幂等依据: 同键重复导入在 create-if-absent 策略下不产生新行
// 对齐: close_cash_entry 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseCashEntry {
    pub uid: String,                                       // 记录 ID（UUID）
    pub user_id: String,                                   // 所属用户（按工作簿文件名解析）
    pub workbook: String,                                  // 工作簿文件名
    pub sheet_name: String,                                // 工作表名
    pub entry_date: NaiveDate,                             // 业务日期（表名/字段值/当天 三级回退）
    pub data: serde_json::Map<String, serde_json::Value>,  // 字段 key → 取出的值（data_json）
    pub source_version: String,                            // 来源结构版本
    pub created_at: DateTime<Utc>,                         // 记录创建时间
    pub updated_at: DateTime<Utc>,                         // 记录更新时间
}

// ==========================================
// MasterSnapshot - 主表（A to Z）全量快照
// ==========================================
// 只追加,不原地更新; 按 snapshot_at 倒序即审计时间线
// 对齐: a2z_snapshot 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterSnapshot {
    pub uid: String,                  // 记录 ID（UUID）
    pub snapshot_at: DateTime<Utc>,   // 快照时间
    pub data: serde_json::Value,      // 全部工作表的单元格内容（data_json）
    pub note: Option<String>,         // 备注（触发原因等）
}
