// ==========================================
// 门店日结系统 - 取值引擎
// ==========================================
// 职责: 按既定结构从网格里取出一条逻辑记录
// 红线: 表格模式只读首个数据行——一张表一条记录,
//       多行数据属于既定约束,不在此处“修复”
// ==========================================

use crate::domain::{CellValue, SheetGrid, SheetSchema};

/// 按结构取出一条记录
///
/// 返回按字段声明顺序排列的 (key, 值) 序列; 取值永不失败,
/// 缺失单元格一律为空值。
pub fn extract_record(grid: &SheetGrid, schema: &SheetSchema) -> Vec<(String, CellValue)> {
    match schema {
        SheetSchema::KeyValue { fields } | SheetSchema::Fallback { fields } => fields
            .iter()
            .map(|f| (f.key.clone(), grid.get(f.row, f.col).clone()))
            .collect(),
        SheetSchema::Table {
            data_row, columns, ..
        } => columns
            .iter()
            .map(|f| (f.key.clone(), grid.get(*data_row, f.column).clone()))
            .collect(),
    }
}

/// 记录折算为 data_json 存储形态
pub fn record_to_json(
    record: &[(String, CellValue)],
) -> serde_json::Map<String, serde_json::Value> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}
