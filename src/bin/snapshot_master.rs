// 小工具: 采集一次主表（A to Z Format.xlsx）全量快照,追加到审计时间线。
//
// 用法:
//   cargo run --bin snapshot_master -- [db_path] [close_cash_dir] [note]
//
// 快照只追加不覆盖,按 snapshot_at 倒序即审计历史。

use close_cash::api::capture_master_snapshot;
use close_cash::config::{get_close_cash_dir, get_default_db_path};
use close_cash::db::open_sqlite_connection;
use close_cash::repository::MasterSnapshotRepository;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    close_cash::logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let directory = args.next().map(PathBuf::from).unwrap_or_else(get_close_cash_dir);
    let note = args.next();

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let repo = MasterSnapshotRepository::from_connection(conn)?;

    let snapshot = capture_master_snapshot(&repo, &directory, note.as_deref())?;

    println!("snapshot_uid={}", snapshot.uid);
    println!("snapshot_at={}", snapshot.snapshot_at.to_rfc3339());
    Ok(())
}
