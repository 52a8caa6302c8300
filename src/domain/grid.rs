// ==========================================
// 门店日结系统 - 工作表网格模型
// ==========================================
// 职责: 探测与取值所依赖的内存网格（读入后与文件解耦）
// 约束: 行列均为 1 起始,与 Excel 坐标一致
// ==========================================

use chrono::NaiveDateTime;
use std::collections::HashMap;

/// 单元格值
///
/// 读入时统一换算为计算值（公式不保留），四种形态与工作簿
/// 单元格的实际内容一一对应。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 空单元格
    Null,
    /// 数值（整数也折算为 f64）
    Number(f64),
    /// 文本
    Text(String),
    /// 日期时间
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 非空文本才返回 Some（标签判定用）
    pub fn as_label(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// 折算为 JSON 值（data_json / 快照存储用）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

/// 空单元格的共享实例（get 越界/缺失时返回）
static NULL_CELL: CellValue = CellValue::Null;

// ==========================================
// SheetGrid - 有界矩形网格
// ==========================================
// 稀疏存储: 只保留非空单元格,但 max_row/max_col 维持矩形边界
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    max_row: u32,
    max_col: u32,
    cells: HashMap<(u32, u32), CellValue>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// 网格最大行号（1 起始；空表为 0）
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// 网格最大列号（1 起始；空表为 0）
    pub fn max_col(&self) -> u32 {
        self.max_col
    }

    /// 读取单元格（越界或缺失返回空值）
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&NULL_CELL)
    }

    /// 写入单元格并扩展边界
    ///
    /// 空值不落存储,但仍计入边界（与读入文件时的 max_row 语义一致）
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        if value.is_null() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// 遍历非空单元格（快照序列化用）
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_bounds_is_null() {
        let grid = SheetGrid::new();
        assert!(grid.get(1, 1).is_null());
        assert_eq!(grid.max_row(), 0);
    }

    #[test]
    fn test_set_extends_bounds() {
        let mut grid = SheetGrid::new();
        grid.set(3, 2, CellValue::Text("现金".to_string()));
        grid.set(5, 1, CellValue::Null);

        assert_eq!(grid.max_row(), 5);
        assert_eq!(grid.max_col(), 2);
        assert_eq!(grid.get(3, 2), &CellValue::Text("现金".to_string()));
        assert!(grid.get(5, 1).is_null());
    }

    #[test]
    fn test_as_label_rejects_blank() {
        assert_eq!(CellValue::Text("  ".to_string()).as_label(), None);
        assert_eq!(CellValue::Number(3.0).as_label(), None);
        assert_eq!(
            CellValue::Text(" Cashier Name ".to_string()).as_label(),
            Some("Cashier Name")
        );
    }
}
