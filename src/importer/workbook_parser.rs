// ==========================================
// 门店日结系统 - 工作簿解析器
// ==========================================
// 职责: 用 calamine 把 .xlsx 读成内存网格（逐表）
// 说明: 读取的是计算值——公式单元格取缓存结果,
//       公式原文属于编辑器展示,不进导入管道
// ==========================================

use crate::domain::{CellValue, SheetGrid};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::workbook_files::has_xlsx_extension;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// 解析后的工作簿: 文件名 + 各表网格（保持文件内表顺序）
#[derive(Debug)]
pub struct ParsedWorkbook {
    pub filename: String,
    pub sheets: Vec<(String, SheetGrid)>,
}

/// 读取一个工作簿的全部工作表
pub fn read_workbook(path: &Path) -> ImportResult<ParsedWorkbook> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !has_xlsx_extension(&filename) {
        return Err(ImportError::UnsupportedFormat(filename));
    }

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| ImportError::ExcelParseError {
            workbook: filename.clone(),
            message: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError {
                workbook: filename.clone(),
                message: format!("{}: {}", sheet_name, e),
            })?;
        sheets.push((sheet_name, range_to_grid(&range)));
    }

    Ok(ParsedWorkbook { filename, sheets })
}

/// calamine Range → 1 起始的内存网格
fn range_to_grid(range: &Range<Data>) -> SheetGrid {
    let mut grid = SheetGrid::new();

    if let Some((start_row, start_col)) = range.start() {
        for (r, row) in range.rows().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let row_1 = start_row + r as u32 + 1;
                let col_1 = start_col + c as u32 + 1;
                grid.set(row_1, col_1, data_to_cell(cell));
            }
        }
    }

    grid
}

/// calamine 单元格 → CellValue
fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        // 空字符串视同空单元格,避免“看不见的值”干扰表头/标签判定
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            // 1904/异常序列号解不出来时保底按数值处理
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Null,
    }
}

/// ISO 日期时间串解析（日期-only 补零点）
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_to_cell_mapping() {
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Null);
        assert_eq!(data_to_cell(&Data::String(String::new())), CellValue::Null);
        assert_eq!(
            data_to_cell(&Data::String("Ali".to_string())),
            CellValue::Text("Ali".to_string())
        );
        assert_eq!(data_to_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(data_to_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(data_to_cell(&Data::Bool(true)), CellValue::Number(1.0));
    }

    #[test]
    fn test_iso_datetime_parsing() {
        let dt = parse_iso_datetime("2025-10-23T08:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2025-10-23 08:30");

        let d = parse_iso_datetime("2025-10-23").unwrap();
        assert_eq!(d.format("%H:%M:%S").to_string(), "00:00:00");

        assert!(parse_iso_datetime("not-a-date").is_none());
    }

    #[test]
    fn test_read_workbook_round_trip_with_writer() {
        // umya 写一个小工作簿,calamine 读回来
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ali.xlsx");

        let mut book = umya_spreadsheet::new_file();
        let ws = book.get_sheet_by_name_mut("Sheet1").unwrap();
        ws.get_cell_mut((1u32, 1u32)).set_value("Cashier Name");
        ws.get_cell_mut((2u32, 1u32)).set_value("Ali");
        ws.get_cell_mut((2u32, 2u32)).set_value_number(89500.0);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let parsed = read_workbook(&path).unwrap();
        assert_eq!(parsed.filename, "ali.xlsx");
        assert_eq!(parsed.sheets.len(), 1);

        let (sheet_name, grid) = &parsed.sheets[0];
        assert_eq!(sheet_name, "Sheet1");
        assert_eq!(grid.get(1, 1), &CellValue::Text("Cashier Name".to_string()));
        assert_eq!(grid.get(1, 2), &CellValue::Text("Ali".to_string()));
        assert_eq!(grid.get(2, 2), &CellValue::Number(89500.0));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_workbook(Path::new("/tmp/不存在.xlsx"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_read_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"x").unwrap();

        let result = read_workbook(&path);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
