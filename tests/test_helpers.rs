// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 测试数据库初始化、用户种子、工作簿夹具
// ==========================================

#![allow(dead_code)]

use close_cash::domain::UserAccount;
use close_cash::repository::{
    CloseCashEntryRepository, CloseCashSchemaRepository, MasterSnapshotRepository,
    UserAccountRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();

    let conn = Arc::new(Mutex::new(close_cash::db::open_sqlite_connection(&db_path)?));

    // 各仓储的 from_connection 会执行 ensure_table
    UserAccountRepository::from_connection(conn.clone())?;
    CloseCashSchemaRepository::from_connection(conn.clone())?;
    CloseCashEntryRepository::from_connection(conn.clone())?;
    MasterSnapshotRepository::from_connection(conn)?;

    Ok((temp_file, db_path))
}

/// 打开一个已初始化的连接（PRAGMA 统一走 db 模块）
pub fn open_conn(db_path: &str) -> Connection {
    close_cash::db::open_sqlite_connection(db_path).expect("打开测试数据库失败")
}

/// 插入一个在职用户并返回账户
pub fn seed_user(db_path: &str, username: &str) -> UserAccount {
    let repo = UserAccountRepository::new(db_path).expect("创建用户仓储失败");
    let account = UserAccount::new(username, None);
    repo.insert(&account).expect("插入测试用户失败");
    account
}

// ==========================================
// 工作簿夹具（umya 写,calamine 读回）
// ==========================================

/// 新建只含一张命名工作表的工作簿
pub fn new_workbook(first_sheet: &str) -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_by_name_mut("Sheet1")
        .expect("默认工作表缺失")
        .set_name(first_sheet);
    book
}

/// 取（或建）一张工作表
pub fn sheet_mut<'a>(book: &'a mut Spreadsheet, name: &str) -> &'a mut Worksheet {
    if book.get_sheet_by_name(name).is_none() {
        book.new_sheet(name).expect("创建工作表失败");
    }
    book.get_sheet_by_name_mut(name).expect("工作表不可见")
}

/// 写文本单元格（参数为 行, 列; 强制字符串,避免 umya 类型猜测）
pub fn set_text(ws: &mut Worksheet, row: u32, col: u32, value: &str) {
    ws.get_cell_mut((col, row)).set_value_string(value);
}

/// 写数值单元格（参数为 行, 列）
pub fn set_number(ws: &mut Worksheet, row: u32, col: u32, value: f64) {
    ws.get_cell_mut((col, row)).set_value_number(value);
}

/// A 列标签 + B 列文本值,一行一对（从第 1 行起）
pub fn fill_kv_rows(ws: &mut Worksheet, pairs: &[(&str, &str)]) {
    for (i, (label, value)) in pairs.iter().enumerate() {
        let row = i as u32 + 1;
        set_text(ws, row, 1, label);
        set_text(ws, row, 2, value);
    }
}

/// 落盘
pub fn save_workbook(book: &Spreadsheet, path: &Path) {
    umya_spreadsheet::writer::xlsx::write(book, path).expect("写测试工作簿失败");
}
