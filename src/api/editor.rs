// ==========================================
// 门店日结系统 - 编辑器接口
// ==========================================
// 职责: 网格编辑器的读/存两个入口
// 说明: 编辑器读的是原始内容（公式原文保留,标记 is_formula
//       供只读展示）,与导入管道读计算值是两条路
// 红线: 访问控制（谁能看/改哪个文件）在外部系统,这里不做判定
// ==========================================

use crate::engine::value_writer::{ensure_sheet, save_workbook_atomic, WriteError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// 编辑器接口错误类型
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// 编辑器单元格（展示口径）
#[derive(Debug, Clone, Serialize)]
pub struct EditorCell {
    pub row: u32,           // 行号（1 起始）
    pub col: u32,           // 列号（1 起始）
    pub coordinate: String, // A1 坐标
    pub value: String,      // 原始内容（公式单元格为公式原文）
    pub is_formula: bool,   // 是否公式单元格（只读展示用）
}

/// 编辑器网格（一张工作表的全量矩形）
#[derive(Debug, Clone, Serialize)]
pub struct EditorGrid {
    pub sheet_name: String,
    pub max_row: u32,
    pub max_col: u32,
    pub rows: Vec<Vec<EditorCell>>,
}

/// 一次单元格编辑
#[derive(Debug, Clone, Deserialize)]
pub struct CellChange {
    pub row: u32,
    pub col: u32,
    pub value: String,
}

/// 读取一张工作表的全量网格（编辑器展示用）
///
/// sheet_name 为 None 时取第一张表（工作簿的“活动表”口径）。
pub fn load_editor_grid(path: &Path, sheet_name: Option<&str>) -> Result<EditorGrid, EditorError> {
    let book =
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| WriteError::WorkbookRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let ws = match sheet_name {
        Some(name) => book
            .get_sheet_by_name(name)
            .ok_or_else(|| EditorError::SheetNotFound(name.to_string()))?,
        None => book
            .get_sheet_collection()
            .first()
            .ok_or_else(|| EditorError::SheetNotFound("<空工作簿>".to_string()))?,
    };

    // 空表也给 1x1,编辑器始终有格子可画
    let max_row = ws.get_highest_row().max(1);
    let max_col = ws.get_highest_column().max(1);

    let mut rows = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let mut cells = Vec::with_capacity(max_col as usize);
        for col in 1..=max_col {
            let (value, is_formula) = match ws.get_cell((col, row)) {
                Some(cell) => {
                    let formula = cell.get_formula().to_string();
                    if formula.is_empty() {
                        (cell.get_value().to_string(), false)
                    } else {
                        (format!("={}", formula), true)
                    }
                }
                None => (String::new(), false),
            };

            cells.push(EditorCell {
                row,
                col,
                coordinate: format!("{}{}", column_letter(col), row),
                value,
                is_formula,
            });
        }
        rows.push(cells);
    }

    Ok(EditorGrid {
        sheet_name: ws.get_name().to_string(),
        max_row,
        max_col,
        rows,
    })
}

/// 应用一批单元格编辑并落盘
///
/// # 值折算（沿用编辑器前端的约定）
/// - 空串 → 清空单元格
/// - 去掉 . - + 后全是数字 → 按数值写入
/// - 其余 → 文本
///
/// 返回实际应用的编辑数。
pub fn apply_cell_changes(
    path: &Path,
    sheet_name: Option<&str>,
    changes: &[CellChange],
) -> Result<usize, EditorError> {
    if changes.is_empty() {
        return Ok(0);
    }

    let mut book =
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| WriteError::WorkbookRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let target = match sheet_name {
        Some(name) => name.to_string(),
        None => book
            .get_sheet_collection()
            .first()
            .map(|ws| ws.get_name().to_string())
            .ok_or_else(|| EditorError::SheetNotFound("<空工作簿>".to_string()))?,
    };
    let ws = ensure_sheet(&mut book, &target)?;

    let mut applied = 0;
    for change in changes {
        if change.row == 0 || change.col == 0 {
            continue;
        }
        let cell = ws.get_cell_mut((change.col, change.row));

        if change.value.is_empty() {
            cell.set_value("");
        } else if looks_numeric(&change.value) {
            match change.value.parse::<f64>() {
                Ok(n) => {
                    cell.set_value_number(n);
                }
                Err(_) => {
                    cell.set_value_string(change.value.clone());
                }
            }
        } else {
            cell.set_value_string(change.value.clone());
        }
        applied += 1;
    }

    save_workbook_atomic(&book, path)?;
    debug!(sheet = %target, applied, "编辑已保存");
    Ok(applied)
}

/// 去掉小数点与正负号后全为数字（编辑器前端的数值判定口径）
fn looks_numeric(value: &str) -> bool {
    let stripped: String = value
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '+'))
        .collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

/// 列号 → 字母坐标（1 → A, 27 → AA）
fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).to_string()
}
