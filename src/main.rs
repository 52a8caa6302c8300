// ==========================================
// 门店日结系统 - 批量导入命令
// ==========================================
// 用法:
//   close-cash [--workbook <文件名.xlsx>] [--force] [--dir <目录>] [--db <路径>]
//
// 说明:
//   --workbook  只导入指定工作簿（如 Ahmad.xlsx）
//   --force     覆盖已存在的结构/条目（默认 create-if-absent,幂等）
//   --dir       日结目录（默认 CLOSE_CASH_DIR 或 ./Close Cash）
//   --db        SQLite 路径（默认 CLOSE_CASH_DB_PATH 或用户数据目录）
// ==========================================

use close_cash::config::{get_close_cash_dir, get_default_db_path, DetectionConfig};
use close_cash::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use close_cash::importer::{ImportOptions, ImportOrchestrator};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn print_usage() {
    println!("用法: close-cash [--workbook <文件名.xlsx>] [--force] [--dir <目录>] [--db <路径>]");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    close_cash::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 日结工作簿批量导入", close_cash::APP_NAME);
    tracing::info!("系统版本: {}", close_cash::VERSION);
    tracing::info!("==================================================");

    let mut options = ImportOptions::default();
    let mut directory: Option<PathBuf> = None;
    let mut db_path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--workbook" => {
                options.workbook = args.next().filter(|s| !s.trim().is_empty());
                if options.workbook.is_none() {
                    print_usage();
                    return Err("--workbook 需要一个文件名参数".into());
                }
            }
            "--force" => options.force = true,
            "--dir" => {
                directory = args.next().map(PathBuf::from);
                if directory.is_none() {
                    print_usage();
                    return Err("--dir 需要一个目录参数".into());
                }
            }
            "--db" => {
                db_path = args.next();
                if db_path.is_none() {
                    print_usage();
                    return Err("--db 需要一个路径参数".into());
                }
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                print_usage();
                return Err(format!("未知参数: {}", other).into());
            }
        }
    }

    let directory = directory.unwrap_or_else(get_close_cash_dir);
    let db_path = db_path.unwrap_or_else(get_default_db_path);

    tracing::info!("日结目录: {}", directory.display());
    tracing::info!("使用数据库: {}", db_path);
    if options.force {
        tracing::info!("策略: force-overwrite（覆盖已有结构/条目）");
    } else {
        tracing::info!("策略: create-if-absent（幂等,不覆盖）");
    }

    let conn = open_sqlite_connection(&db_path)?;

    // 旧库提示（不自动迁移）
    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                db_version = version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本与当前代码不一致"
            );
        }
    }

    let orchestrator = ImportOrchestrator::new(
        Arc::new(Mutex::new(conn)),
        directory,
        DetectionConfig::default(),
    )?;
    let report = orchestrator.run(&options)?;

    println!();
    println!("处理工作簿: {} 个（跳过 {} 个）", report.files_processed, report.files_skipped);
    for skipped in &report.skipped {
        println!("  - 跳过 {}: {}", skipped.filename, skipped.reason);
    }
    println!(
        "扫描工作表 {} 张,写入结构 {} 条、条目 {} 条",
        report.sheets_seen, report.schemas_written, report.entries_written
    );
    println!("已导入/更新 {} 张工作表的结构与条目。", report.sheets_imported);

    Ok(())
}
