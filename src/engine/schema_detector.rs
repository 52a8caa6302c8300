// ==========================================
// 门店日结系统 - 表结构探测引擎
// ==========================================
// 职责: 对单张工作表做模式识别,产出归一化字段清单
// 红线: 探测是全函数——任何网格都必须返回某个结构,不存在“非法表”
// 红线: 启发式按 键值 → 表格 → 兜底 的固定顺序,不得调换
// ==========================================
// 输入: 内存网格 + 探测配置
// 输出: SheetSchema（纯函数,无副作用）
// ==========================================

use crate::config::DetectionConfig;
use crate::domain::{CellField, CellValue, ColumnField, FieldType, SheetGrid, SheetSchema};
use crate::engine::type_infer::infer_type;
use std::collections::HashSet;
use tracing::debug;

// ==========================================
// SchemaDetector - 结构探测引擎
// ==========================================
// 无状态引擎,阈值全部来自 DetectionConfig
pub struct SchemaDetector {
    config: DetectionConfig,
}

impl SchemaDetector {
    /// 创建探测引擎
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// 使用默认阈值创建
    pub fn with_defaults() -> Self {
        Self::new(DetectionConfig::default())
    }

    /// 探测一张工作表的结构
    ///
    /// # 顺序
    /// 1. 键值启发式: A 列标签命中数达到阈值 → kv
    /// 2. 表格启发式: 首个“≥2 个非空单元格”的行作表头 → table
    /// 3. 兜底: 合成 Field 1..N
    pub fn detect(&self, grid: &SheetGrid) -> SheetSchema {
        // 空表按 1x1 处理,保证兜底仍能产出一个字段
        let max_row = grid.max_row().max(1);
        let max_col = grid.max_col().max(1);

        if let Some(schema) = self.detect_key_value(grid, max_row) {
            debug!(fields = schema.field_count(), "命中键值模式");
            return schema;
        }

        if let Some(schema) = self.detect_table(grid, max_row, max_col) {
            debug!(fields = schema.field_count(), "命中表格模式");
            return schema;
        }

        let schema = self.fallback(max_row);
        debug!(fields = schema.field_count(), "启发式未命中,使用兜底结构");
        schema
    }

    /// 键值启发式
    ///
    /// 扫描前 kv_scan_rows 行,A 列为非空文本即计一次命中,
    /// 值固定取 B 列。命中数达到 kv_min_hits 才成立。
    fn detect_key_value(&self, grid: &SheetGrid, max_row: u32) -> Option<SheetSchema> {
        let mut fields = Vec::new();
        let mut used_keys = HashSet::new();

        for row in 1..=max_row.min(self.config.kv_scan_rows) {
            let label = match grid.get(row, 1).as_label() {
                Some(l) => l.to_string(),
                None => continue,
            };

            let mut key = normalize_label_key(&label, self.config.key_max_len);
            if key.is_empty() {
                key = format!("field_{}", row);
            }
            let key = dedup_key(key, row, &mut used_keys);

            fields.push(CellField {
                key,
                label,
                field_type: infer_type(grid.get(row, 2)),
                row,
                col: 2,
                required: false,
            });
        }

        if fields.len() as u32 >= self.config.kv_min_hits {
            Some(SheetSchema::KeyValue { fields })
        } else {
            None
        }
    }

    /// 表格启发式
    ///
    /// 前 table_scan_rows 行里第一个非空单元格数达到
    /// table_min_header_cells 的行即表头; 数据行固定为表头下一行
    /// （夹在 max_row 以内）——单记录约束。
    fn detect_table(&self, grid: &SheetGrid, max_row: u32, max_col: u32) -> Option<SheetSchema> {
        let scan_cols = max_col.min(self.config.table_scan_cols);

        for row in 1..=max_row.min(self.config.table_scan_rows) {
            let header_cols: Vec<u32> = (1..=scan_cols)
                .filter(|&col| is_header_candidate(grid.get(row, col)))
                .collect();

            if (header_cols.len() as u32) < self.config.table_min_header_cells {
                continue;
            }

            let header_row = row;
            let data_row = (header_row + 1).min(max_row);
            let mut used_keys = HashSet::new();

            let columns = header_cols
                .into_iter()
                .map(|col| {
                    let label = display_string(grid.get(header_row, col)).trim().to_string();
                    let mut key = normalize_label_key(&label, self.config.key_max_len);
                    if key.is_empty() {
                        key = format!("col_{}", col);
                    }
                    let key = dedup_key(key, col, &mut used_keys);

                    ColumnField {
                        key,
                        label,
                        field_type: infer_type(grid.get(data_row, col)),
                        column: col,
                        required: false,
                    }
                })
                .collect();

            return Some(SheetSchema::Table {
                header_row,
                data_row,
                columns,
            });
        }

        None
    }

    /// 兜底结构: Field 1..min(max_row, fallback_rows),值列固定为 B
    fn fallback(&self, max_row: u32) -> SheetSchema {
        let fields = (1..=max_row.min(self.config.fallback_rows))
            .map(|row| CellField {
                key: format!("field_{}", row),
                label: format!("Field {}", row),
                field_type: FieldType::Text,
                row,
                col: 2,
                required: false,
            })
            .collect();

        SheetSchema::Fallback { fields }
    }
}

/// 表头候选判定: 空值与空串不算,其余（含数字/日期表头）都算
fn is_header_candidate(value: &CellValue) -> bool {
    match value {
        CellValue::Null => false,
        CellValue::Text(s) => !s.is_empty(),
        _ => true,
    }
}

/// 单元格按显示口径转字符串（表头标签用）
fn display_string(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// 标签归一化为字段 key
///
/// # 规则（与既有数据保持一致,顺序不可变）
/// 1. 连续的非 [A-Za-z0-9_] 字符折叠为一个下划线
/// 2. 去掉首尾下划线
/// 3. 转小写
/// 4. 截断到 max_len 个字符
///
/// 归一化可能得到空串（纯符号/非拉丁标签）,由调用方合成占位 key。
pub fn normalize_label_key(label: &str, max_len: usize) -> String {
    let mut collapsed = String::with_capacity(label.len());
    let mut last_was_sep = false;

    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            collapsed.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            collapsed.push('_');
            last_was_sep = true;
        }
    }

    collapsed
        .trim_matches('_')
        .to_lowercase()
        .chars()
        .take(max_len)
        .collect()
}

/// key 去重: 同名 key 追加行/列号后缀,保证单表内唯一
fn dedup_key(key: String, ordinal: u32, used: &mut HashSet<String>) -> String {
    let unique = if used.contains(&key) {
        format!("{}_{}", key, ordinal)
    } else {
        key
    };
    used.insert(unique.clone());
    unique
}
