// ==========================================
// 门店日结系统 - 工作簿归属解析
// ==========================================
// 职责: 文件名主干 → 用户账户（大小写不敏感）
// 约束: 只做查找不做副作用,查不到返回 None,
//       跳过还是中止由调用方决定
// ==========================================

use crate::domain::UserAccount;
use crate::importer::workbook_files::workbook_stem;
use crate::repository::{RepositoryResult, UserAccountRepository};
use rusqlite::Transaction;
use tracing::debug;

/// 在事务内解析工作簿归属
///
/// `ali.xlsx` → 用户名 `ali`（匹配大小写不敏感）。
/// 改名/离职留下的孤儿工作簿解析为 None: 结构照常入库,条目不写。
pub fn resolve_workbook_owner(
    tx: &Transaction,
    filename: &str,
) -> RepositoryResult<Option<UserAccount>> {
    let username = workbook_stem(filename);
    let account = UserAccountRepository::find_by_username_tx(tx, username)?;

    match &account {
        Some(user) => debug!(workbook = filename, user_id = %user.user_id, "工作簿归属已解析"),
        None => debug!(workbook = filename, username, "工作簿无匹配用户"),
    }

    Ok(account)
}
