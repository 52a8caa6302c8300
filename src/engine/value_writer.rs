// ==========================================
// 门店日结系统 - 写回引擎
// ==========================================
// 职责: 按既定结构把一条记录写回工作簿文件
// 约束: 目标工作表缺失时先创建,绝不因缺表失败（防止静默丢数据）
// 约束: 落盘走 临时文件 + 原子重命名,不直接覆写源文件
// ==========================================
// 注: 文件级无锁,同一文件同时只允许一个写入方（运维口径保证）
// ==========================================

use crate::domain::SheetSchema;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};
use uuid::Uuid;

/// 写回错误类型
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("工作簿读取失败 ({path}): {message}")]
    WorkbookRead { path: String, message: String },

    #[error("工作簿写入失败 ({path}): {message}")]
    WorkbookWrite { path: String, message: String },

    #[error("工作表创建失败 ({sheet}): {message}")]
    SheetCreate { sheet: String, message: String },

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 按结构把一条记录写回工作簿
///
/// # 行为
/// - kv/fallback: 逐字段写 (row, col) 单元格
/// - table: 先回写表头标签,再写数据行单元格（保持表头与数据一致）
/// - data 里缺失的 key 写为空值
pub fn write_record(
    path: &Path,
    sheet_name: &str,
    schema: &SheetSchema,
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), WriteError> {
    let mut book =
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| WriteError::WorkbookRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let ws = ensure_sheet(&mut book, sheet_name)?;

    match schema {
        SheetSchema::KeyValue { fields } | SheetSchema::Fallback { fields } => {
            for field in fields {
                set_cell(ws, field.row, field.col, data.get(&field.key));
            }
        }
        SheetSchema::Table {
            header_row,
            data_row,
            columns,
        } => {
            for field in columns {
                ws.get_cell_mut((field.column, *header_row))
                    .set_value_string(field.label.clone());
                set_cell(ws, *data_row, field.column, data.get(&field.key));
            }
        }
    }

    save_workbook_atomic(&book, path)?;
    debug!(
        sheet = sheet_name,
        fields = schema.field_count(),
        "记录已写回工作簿"
    );
    Ok(())
}

/// 获取目标工作表,缺失时创建空表
pub(crate) fn ensure_sheet<'a>(
    book: &'a mut Spreadsheet,
    sheet_name: &str,
) -> Result<&'a mut Worksheet, WriteError> {
    if book.get_sheet_by_name(sheet_name).is_none() {
        book.new_sheet(sheet_name)
            .map_err(|e| WriteError::SheetCreate {
                sheet: sheet_name.to_string(),
                message: e.to_string(),
            })?;
    }

    book.get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| WriteError::SheetCreate {
            sheet: sheet_name.to_string(),
            message: "创建后仍不可见".to_string(),
        })
}

/// 落盘: 写同目录临时文件,成功后原子重命名覆盖源文件
pub(crate) fn save_workbook_atomic(book: &Spreadsheet, path: &Path) -> Result<(), WriteError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "workbook.xlsx".to_string());
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    umya_spreadsheet::writer::xlsx::write(book, &tmp_path).map_err(|e| {
        WriteError::WorkbookWrite {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        // 重命名失败时不留残余临时文件
        let _ = std::fs::remove_file(&tmp_path);
        return Err(WriteError::Io(e));
    }

    Ok(())
}

/// 写单元格,按 JSON 值形态分派
///
/// 文本一律强制按字符串写入: umya 的 set_value 会对 "89500"
/// 这类内容做类型猜测,导回时文本会变数值,破坏往返一致性。
fn set_cell(ws: &mut Worksheet, row: u32, col: u32, value: Option<&serde_json::Value>) {
    // umya 坐标为 (列, 行)
    let cell = ws.get_cell_mut((col, row));
    match value {
        None | Some(serde_json::Value::Null) => {
            cell.set_value("");
        }
        Some(serde_json::Value::Number(n)) => {
            cell.set_value_number(n.as_f64().unwrap_or(0.0));
        }
        Some(serde_json::Value::String(s)) => {
            cell.set_value_string(s.clone());
        }
        Some(serde_json::Value::Bool(b)) => {
            cell.set_value_bool(*b);
        }
        Some(other) => {
            cell.set_value_string(other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellField, FieldType};

    fn kv_schema() -> SheetSchema {
        SheetSchema::KeyValue {
            fields: vec![
                CellField {
                    key: "cashier_name".to_string(),
                    label: "Cashier Name".to_string(),
                    field_type: FieldType::Text,
                    row: 1,
                    col: 2,
                    required: false,
                },
                CellField {
                    key: "dollar_rate".to_string(),
                    label: "Dollar Rate".to_string(),
                    field_type: FieldType::Number,
                    row: 2,
                    col: 2,
                    required: false,
                },
            ],
        }
    }

    #[test]
    fn test_write_record_into_existing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ali.xlsx");

        let book = umya_spreadsheet::new_file();
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut data = serde_json::Map::new();
        data.insert("cashier_name".to_string(), serde_json::json!("Ali"));
        data.insert("dollar_rate".to_string(), serde_json::json!(89500.0));

        write_record(&path, "Sheet1", &kv_schema(), &data).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let ws = book.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(ws.get_cell((2u32, 1u32)).unwrap().get_value(), "Ali");
        assert_eq!(ws.get_cell((2u32, 2u32)).unwrap().get_value(), "89500");
    }

    #[test]
    fn test_write_record_creates_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ali.xlsx");

        let book = umya_spreadsheet::new_file();
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut data = serde_json::Map::new();
        data.insert("cashier_name".to_string(), serde_json::json!("Ali"));

        // "2025-10-23" 表在文件里不存在,写回应当先建表
        write_record(&path, "2025-10-23", &kv_schema(), &data).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let ws = book.get_sheet_by_name("2025-10-23").expect("缺失的表应被创建");
        assert_eq!(ws.get_cell((2u32, 1u32)).unwrap().get_value(), "Ali");
    }

    #[test]
    fn test_write_record_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghost.xlsx");

        let result = write_record(&path, "Sheet1", &kv_schema(), &serde_json::Map::new());
        assert!(matches!(result, Err(WriteError::WorkbookRead { .. })));
    }

    #[test]
    fn test_table_mode_rewrites_header() {
        use crate::domain::ColumnField;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xlsx");
        let book = umya_spreadsheet::new_file();
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let schema = SheetSchema::Table {
            header_row: 1,
            data_row: 2,
            columns: vec![ColumnField {
                key: "amount".to_string(),
                label: "Amount".to_string(),
                field_type: FieldType::Number,
                column: 1,
                required: false,
            }],
        };
        let mut data = serde_json::Map::new();
        data.insert("amount".to_string(), serde_json::json!(150.0));

        write_record(&path, "Sheet1", &schema, &data).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let ws = book.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(ws.get_cell((1u32, 1u32)).unwrap().get_value(), "Amount");
        assert_eq!(ws.get_cell((1u32, 2u32)).unwrap().get_value(), "150");
    }
}
