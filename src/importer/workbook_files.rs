// ==========================================
// 门店日结系统 - 工作簿文件枚举
// ==========================================
// 职责: 日结目录下的员工工作簿清单与文件名规则
// 约束: 主表（A to Z Format.xlsx）不参与按员工枚举
// 约束: 文件名过滤防御路径穿越（上传/下载共用同一规则）
// ==========================================

use crate::config::MASTER_FILENAME;
use crate::importer::error::{ImportError, ImportResult};
use std::path::{Path, PathBuf};

/// 文件名长度上限
const MAX_FILENAME_LEN: usize = 50;

/// 文件名校验: 仅接受不含路径成分的 .xlsx 短文件名
pub fn validate_filename(filename: &str) -> bool {
    if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
        return false;
    }
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return false;
    }
    has_xlsx_extension(filename)
}

/// 是否以 .xlsx 结尾（大小写不敏感）
pub fn has_xlsx_extension(filename: &str) -> bool {
    filename.len() > 5 && filename[filename.len() - 5..].eq_ignore_ascii_case(".xlsx")
}

/// 去掉 .xlsx 后缀取主干（身份解析的匹配键）
pub fn workbook_stem(filename: &str) -> &str {
    if has_xlsx_extension(filename) {
        &filename[..filename.len() - 5]
    } else {
        filename
    }
}

/// 是否为主表文件
pub fn is_master(filename: &str) -> bool {
    filename == MASTER_FILENAME
}

/// 枚举员工工作簿
///
/// # 规则
/// - 目录不存在 → 空列表（首次部署时目录可能还没建）
/// - 仅收 .xlsx（大小写不敏感）,排除主表与非法文件名
/// - 按文件名排序,保证批处理顺序稳定
pub fn list_employee_workbooks(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ImportError::DirectoryReadError {
        dir: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut workbooks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ImportError::DirectoryReadError {
            dir: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let name = entry.file_name().to_string_lossy().to_string();
        if !validate_filename(&name) || is_master(&name) {
            continue;
        }
        workbooks.push(entry.path());
    }

    workbooks.sort();
    Ok(workbooks)
}
