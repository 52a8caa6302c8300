// 小工具: 在新库里批量创建用户账户,让工作簿归属解析有处可落。
//
// 用法:
//   cargo run --bin seed_user_accounts -- [db_path] username1 username2 ...
//
// 已存在的用户名（大小写不敏感唯一）会跳过并提示,不中止其余插入。

use close_cash::config::get_default_db_path;
use close_cash::db::open_sqlite_connection;
use close_cash::domain::UserAccount;
use close_cash::repository::{RepositoryError, UserAccountRepository};
use std::sync::{Arc, Mutex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    close_cash::logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("用法: seed_user_accounts [db_path] username1 username2 ...");
        return Err("至少需要一个用户名".into());
    }

    // 第一个参数带 .db 或路径分隔符时当作数据库路径
    let db_path = if args[0].ends_with(".db") || args[0].contains('/') {
        args.remove(0)
    } else {
        get_default_db_path()
    };

    if args.is_empty() {
        return Err("至少需要一个用户名".into());
    }

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let repo = UserAccountRepository::from_connection(conn)?;

    let mut created = 0;
    for username in &args {
        match repo.insert(&UserAccount::new(username, None)) {
            Ok(()) => {
                println!("已创建用户: {}", username);
                created += 1;
            }
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                println!("用户已存在,跳过: {}", username);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("完成: 新建 {} 个账户（数据库 {}）", created, db_path);
    Ok(())
}
