// ==========================================
// 门店日结系统 - 导入编排器集成测试
// ==========================================
// 覆盖: 幂等导入 / force 覆盖 / 无归属工作簿 /
//       表名日期回退 / 单记录约束 / 坏文件隔离
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use close_cash::config::DetectionConfig;
use close_cash::domain::SheetSchema;
use close_cash::importer::{ImportOptions, ImportOrchestrator};
use close_cash::repository::{
    CloseCashEntryRepository, CloseCashSchemaRepository, UserAccountRepository,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use test_helpers::*;

/// 在目录里生成 ali.xlsx: 一张名为 "2025-10-23" 的键值表
///
/// Date 字段故意写成另一天,验证业务日期以表名为准。
fn build_ali_workbook(dir: &Path) {
    let mut book = new_workbook("2025-10-23");
    let ws = sheet_mut(&mut book, "2025-10-23");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ali"),
            ("Date", "2025-10-22"),
            ("Shift Time", "Morning"),
            ("Dollar Rate", "89,500"),
            ("Waste Goods", "12.5"),
        ],
    );
    save_workbook(&book, &dir.join("ali.xlsx"));
}

fn make_orchestrator(db_path: &str, dir: &Path) -> ImportOrchestrator {
    let conn = Arc::new(Mutex::new(open_conn(db_path)));
    ImportOrchestrator::new(conn, dir.to_path_buf(), DetectionConfig::default())
        .expect("创建编排器失败")
}

#[test]
fn test_kv_sheet_named_by_date() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let user = seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    let report = make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();

    assert_eq!(report.files_processed, 1);
    assert_eq!(report.sheets_imported, 1);
    assert_eq!(report.schemas_written, 1);
    assert_eq!(report.entries_written, 1);

    // 结构: 键值模式,字段齐全
    let schema_repo = CloseCashSchemaRepository::new(&db_path).unwrap();
    let record = schema_repo
        .get("ali.xlsx", "2025-10-23", "v1")
        .unwrap()
        .expect("结构应已入库");
    match &record.schema {
        SheetSchema::KeyValue { fields } => {
            let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
            assert_eq!(
                keys,
                vec!["cashier_name", "date", "shift_time", "dollar_rate", "waste_goods"]
            );
        }
        other => panic!("期望 kv 模式,实际 {}", other.mode_name()),
    }

    // 条目: 业务日期取自表名,而非 Date 字段的 2025-10-22
    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    let entry_date = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
    let entry = entry_repo
        .get(&user.user_id, "ali.xlsx", "2025-10-23", entry_date, "v1")
        .unwrap()
        .expect("条目应已入库");

    assert_eq!(entry.data["cashier_name"], serde_json::json!("Ali"));
    assert_eq!(entry.data["shift_time"], serde_json::json!("Morning"));
    assert_eq!(entry.data["date"], serde_json::json!("2025-10-22"));
}

#[test]
fn test_reimport_is_idempotent() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    let orchestrator = make_orchestrator(&db_path, dir.path());
    let first = orchestrator.run(&ImportOptions::default()).unwrap();
    assert_eq!(first.schemas_written, 1);
    assert_eq!(first.entries_written, 1);

    // 第二次 create-if-absent: 不产生任何新行
    let second = orchestrator.run(&ImportOptions::default()).unwrap();
    assert_eq!(second.schemas_written, 0);
    assert_eq!(second.entries_written, 0);
    assert_eq!(second.sheets_imported, 1);

    let schema_repo = CloseCashSchemaRepository::new(&db_path).unwrap();
    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    assert_eq!(schema_repo.count().unwrap(), 1);
    assert_eq!(entry_repo.count().unwrap(), 1);
}

#[test]
fn test_force_overwrites_existing_entry() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let user = seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    let orchestrator = make_orchestrator(&db_path, dir.path());
    orchestrator.run(&ImportOptions::default()).unwrap();

    // 文件里的班次改了
    let mut book = new_workbook("2025-10-23");
    let ws = sheet_mut(&mut book, "2025-10-23");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ali"),
            ("Date", "2025-10-22"),
            ("Shift Time", "Evening"),
            ("Dollar Rate", "89,500"),
            ("Waste Goods", "12.5"),
        ],
    );
    save_workbook(&book, &dir.path().join("ali.xlsx"));

    // create-if-absent 下重导不覆盖
    orchestrator.run(&ImportOptions::default()).unwrap();
    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    let entry_date = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
    let entry = entry_repo
        .get(&user.user_id, "ali.xlsx", "2025-10-23", entry_date, "v1")
        .unwrap()
        .unwrap();
    assert_eq!(entry.data["shift_time"], serde_json::json!("Morning"));

    // force 下覆盖,且仍不新增行
    let report = orchestrator
        .run(&ImportOptions {
            workbook: None,
            force: true,
        })
        .unwrap();
    assert_eq!(report.entries_written, 1);

    let entry = entry_repo
        .get(&user.user_id, "ali.xlsx", "2025-10-23", entry_date, "v1")
        .unwrap()
        .unwrap();
    assert_eq!(entry.data["shift_time"], serde_json::json!("Evening"));
    assert_eq!(entry_repo.count().unwrap(), 1);
}

#[test]
fn test_orphan_workbook_saves_schema_without_entries() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    // ghost.xlsx 没有同名用户
    let mut book = new_workbook("Summary");
    let ws = sheet_mut(&mut book, "Summary");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ghost"),
            ("Date", "2025-10-23"),
            ("Shift Time", "Night"),
            ("Dollar Rate", "90,000"),
            ("Waste Goods", "0"),
        ],
    );
    save_workbook(&book, &dir.path().join("ghost.xlsx"));

    let report = make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();

    // 两个文件都解析成功; ghost 记为“无匹配用户”跳过项
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.files_skipped, 0);
    assert!(report
        .skipped
        .iter()
        .any(|s| s.filename == "ghost.xlsx" && s.reason.contains("无匹配用户")));

    // ghost 的结构照常入库,条目一条不写; ali 不受影响
    let schema_repo = CloseCashSchemaRepository::new(&db_path).unwrap();
    assert!(schema_repo.get("ghost.xlsx", "Summary", "v1").unwrap().is_some());
    assert_eq!(schema_repo.count().unwrap(), 2);

    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    assert_eq!(entry_repo.count().unwrap(), 1);
    assert_eq!(report.sheets_imported, 1);
}

#[test]
fn test_table_sheet_yields_single_entry_from_first_data_row() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let user = seed_user(&db_path, "ahmad");

    // 表格模式: 表头 + 3 个数据行
    let mut book = new_workbook("Credits");
    let ws = sheet_mut(&mut book, "Credits");
    set_text(ws, 1, 1, "Amount");
    set_text(ws, 1, 2, "Currency");
    set_text(ws, 1, 3, "Name");
    set_number(ws, 2, 1, 150.0);
    set_text(ws, 2, 2, "Dollar");
    set_text(ws, 2, 3, "Rayan");
    set_number(ws, 3, 1, 75.0);
    set_text(ws, 3, 2, "Lebanese");
    set_text(ws, 3, 3, "Bar");
    set_number(ws, 4, 1, 20.0);
    set_text(ws, 4, 2, "Dollar");
    set_text(ws, 4, 3, "Store");
    save_workbook(&book, &dir.path().join("ahmad.xlsx"));

    let report = make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();
    assert_eq!(report.entries_written, 1);

    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    let entries = entry_repo.list_by_user(&user.user_id).unwrap();
    assert_eq!(entries.len(), 1, "三个数据行也只出一条记录");

    // 只含首个数据行的值
    let entry = &entries[0];
    assert_eq!(entry.data["amount"], serde_json::json!(150.0));
    assert_eq!(entry.data["currency"], serde_json::json!("Dollar"));
    assert_eq!(entry.data["name"], serde_json::json!("Rayan"));
}

#[test]
fn test_entry_date_defaults_to_today() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let user = seed_user(&db_path, "ali");

    // 表名与所有值都解析不出日期
    let mut book = new_workbook("现金盘点");
    let ws = sheet_mut(&mut book, "现金盘点");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ali"),
            ("Shift Time", "Morning"),
            ("Register", "Front"),
            ("Counted By", "Ali"),
            ("Notes", "ok"),
        ],
    );
    save_workbook(&book, &dir.path().join("ali.xlsx"));

    make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();

    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    let entries = entry_repo.list_by_user(&user.user_id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].entry_date,
        chrono::Local::now().naive_local().date(),
        "没有任何日期线索时落到当天"
    );
}

#[test]
fn test_target_workbook_filter() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    seed_user(&db_path, "ali");
    seed_user(&db_path, "ahmad");
    build_ali_workbook(dir.path());

    let mut book = new_workbook("2025-10-24");
    let ws = sheet_mut(&mut book, "2025-10-24");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ahmad"),
            ("Date", "2025-10-24"),
            ("Shift Time", "Day"),
            ("Dollar Rate", "89,600"),
            ("Waste Goods", "3"),
        ],
    );
    save_workbook(&book, &dir.path().join("ahmad.xlsx"));

    let orchestrator = make_orchestrator(&db_path, dir.path());

    // 只导 ahmad.xlsx
    let report = orchestrator
        .run(&ImportOptions {
            workbook: Some("ahmad.xlsx".to_string()),
            force: false,
        })
        .unwrap();
    assert_eq!(report.files_processed, 1);

    let schema_repo = CloseCashSchemaRepository::new(&db_path).unwrap();
    assert!(schema_repo.get("ahmad.xlsx", "2025-10-24", "v1").unwrap().is_some());
    assert!(schema_repo.get("ali.xlsx", "2025-10-23", "v1").unwrap().is_none());

    // 指定不存在的工作簿: 空报告,不报错
    let report = orchestrator
        .run(&ImportOptions {
            workbook: Some("nobody.xlsx".to_string()),
            force: false,
        })
        .unwrap();
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.sheets_seen, 0);
}

#[test]
fn test_corrupt_file_is_isolated() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    // 一个扩展名对但内容是垃圾的文件
    std::fs::write(dir.path().join("broken.xlsx"), b"not a zip archive").unwrap();

    let report = make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();

    assert_eq!(report.files_skipped, 1);
    assert!(report.skipped.iter().any(|s| s.filename == "broken.xlsx"));

    // 坏文件不拖累其余文件
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.entries_written, 1);

    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    assert_eq!(entry_repo.count().unwrap(), 1);
}

#[test]
fn test_master_workbook_not_enumerated() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    seed_user(&db_path, "ali");
    build_ali_workbook(dir.path());

    // 主表放进目录,不应被当作员工工作簿导入
    let mut book = new_workbook("A to Z");
    let ws = sheet_mut(&mut book, "A to Z");
    set_text(ws, 1, 1, "Store Total");
    set_number(ws, 1, 2, 123.0);
    save_workbook(&book, &dir.path().join("A to Z Format.xlsx"));

    let report = make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();
    assert_eq!(report.files_processed, 1);

    let schema_repo = CloseCashSchemaRepository::new(&db_path).unwrap();
    assert!(schema_repo
        .get("A to Z Format.xlsx", "A to Z", "v1")
        .unwrap()
        .is_none());
}

#[test]
fn test_username_match_is_case_insensitive() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    // 用户名小写,文件名首字母大写
    let user = seed_user(&db_path, "ali");

    let mut book = new_workbook("2025-10-23");
    let ws = sheet_mut(&mut book, "2025-10-23");
    fill_kv_rows(
        ws,
        &[
            ("Cashier Name", "Ali"),
            ("Date", "2025-10-23"),
            ("Shift Time", "Morning"),
            ("Dollar Rate", "89,500"),
            ("Waste Goods", "1"),
        ],
    );
    save_workbook(&book, &dir.path().join("Ali.xlsx"));

    make_orchestrator(&db_path, dir.path())
        .run(&ImportOptions::default())
        .unwrap();

    let entry_repo = CloseCashEntryRepository::new(&db_path).unwrap();
    let entries = entry_repo.list_by_user(&user.user_id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].workbook, "Ali.xlsx");

    // 检查用户目录连大小写混合查询也命中
    let user_repo = UserAccountRepository::new(&db_path).unwrap();
    assert!(user_repo.find_by_username("ALI").unwrap().is_some());
}
