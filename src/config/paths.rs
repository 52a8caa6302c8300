// ==========================================
// 门店日结系统 - 文件与数据库路径
// ==========================================
// 职责: 日结工作簿目录与 SQLite 路径的默认值
// 说明: 均可被环境变量或命令行参数覆盖
// ==========================================

use std::path::PathBuf;

/// 主表文件名（A to Z 汇总表，不参与按员工枚举，仅做快照审计）
pub const MASTER_FILENAME: &str = "A to Z Format.xlsx";

/// 获取日结工作簿目录
///
/// # 优先级
/// 1. 环境变量 CLOSE_CASH_DIR
/// 2. 当前目录下的 ./Close Cash
pub fn get_close_cash_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLOSE_CASH_DIR") {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    PathBuf::from("./Close Cash")
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 CLOSE_CASH_DB_PATH
/// 2. 用户数据目录/close-cash/close_cash.db
/// 3. 回退 ./close_cash.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("CLOSE_CASH_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./close_cash.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("close-cash");
        // 目录创建失败时回退到当前目录，不在此处报错
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("close_cash.db");
        }
    }

    path.to_string_lossy().to_string()
}
