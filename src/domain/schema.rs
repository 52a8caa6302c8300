// ==========================================
// 门店日结系统 - 表结构描述
// ==========================================
// 职责: 工作表的结构化描述（模式 + 字段清单）
// 红线: 结构模式用标签联合表达,禁止字符串比较分支
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 字段类型（仅作界面与校验提示,取值时不强制）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
}

/// 键值/兜底模式的字段: 值固定落在 (row, col) 单元格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellField {
    pub key: String,           // 归一化 key（单表内唯一）
    pub label: String,         // 原始显示标签
    #[serde(rename = "type")]
    pub field_type: FieldType, // 推断类型
    pub row: u32,              // 值所在行
    pub col: u32,              // 值所在列
    #[serde(default)]
    pub required: bool,        // 预留: 必填标记
}

/// 表格模式的字段: 值落在表头列的首个数据行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnField {
    pub key: String,           // 归一化 key（单表内唯一）
    pub label: String,         // 表头显示标签
    #[serde(rename = "type")]
    pub field_type: FieldType, // 推断类型（从首个数据行取样）
    pub column: u32,           // 所在列
    #[serde(default)]
    pub required: bool,        // 预留: 必填标记
}

// ==========================================
// SheetSchema - 结构模式标签联合
// ==========================================
// kv:       A 列标签 / B 列值,一行一字段
// table:    单个表头行,值取其正下方一行（单记录约束）
// fallback: 两种启发式都未命中时的合成结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SheetSchema {
    #[serde(rename = "kv")]
    KeyValue { fields: Vec<CellField> },
    #[serde(rename = "table")]
    Table {
        header_row: u32,
        data_row: u32,
        columns: Vec<ColumnField>,
    },
    #[serde(rename = "fallback")]
    Fallback { fields: Vec<CellField> },
}

impl SheetSchema {
    /// 模式名（日志/报表用）
    pub fn mode_name(&self) -> &'static str {
        match self {
            SheetSchema::KeyValue { .. } => "kv",
            SheetSchema::Table { .. } => "table",
            SheetSchema::Fallback { .. } => "fallback",
        }
    }

    /// 字段数
    pub fn field_count(&self) -> usize {
        match self {
            SheetSchema::KeyValue { fields } | SheetSchema::Fallback { fields } => fields.len(),
            SheetSchema::Table { columns, .. } => columns.len(),
        }
    }

    /// 按声明顺序返回字段 key（取值扫描与日期回退都依赖此顺序）
    pub fn field_keys(&self) -> Vec<&str> {
        match self {
            SheetSchema::KeyValue { fields } | SheetSchema::Fallback { fields } => {
                fields.iter().map(|f| f.key.as_str()).collect()
            }
            SheetSchema::Table { columns, .. } => {
                columns.iter().map(|f| f.key.as_str()).collect()
            }
        }
    }
}

// ==========================================
// SchemaRecord - 持久化的结构定义
// ==========================================
// 自然键: (workbook, sheet_name, version),全局共享（不分用户）
// 对齐: close_cash_schema 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub uid: String,               // 记录 ID（UUID）
    pub workbook: String,          // 工作簿文件名（含扩展名）
    pub sheet_name: String,        // 工作表名
    pub schema: SheetSchema,       // 结构描述（schema_json）
    pub version: String,           // 结构版本号（预留演进,当前恒为 v1）
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_json_mode_tags() {
        let schema = SheetSchema::KeyValue {
            fields: vec![CellField {
                key: "cashier_name".to_string(),
                label: "Cashier Name".to_string(),
                field_type: FieldType::Text,
                row: 1,
                col: 2,
                required: false,
            }],
        };

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["mode"], "kv");
        assert_eq!(json["fields"][0]["type"], "text");
        assert_eq!(json["fields"][0]["row"], 1);

        let back: SheetSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back.mode_name(), "kv");
        assert_eq!(back.field_keys(), vec!["cashier_name"]);
    }

    #[test]
    fn test_table_schema_round_trip() {
        let schema = SheetSchema::Table {
            header_row: 2,
            data_row: 3,
            columns: vec![ColumnField {
                key: "amount".to_string(),
                label: "Amount".to_string(),
                field_type: FieldType::Number,
                column: 4,
                required: false,
            }],
        };

        let json = serde_json::to_string(&schema).unwrap();
        let back: SheetSchema = serde_json::from_str(&json).unwrap();
        match back {
            SheetSchema::Table {
                header_row,
                data_row,
                columns,
            } => {
                assert_eq!(header_row, 2);
                assert_eq!(data_row, 3);
                assert_eq!(columns[0].column, 4);
            }
            other => panic!("期望 table 模式,实际 {}", other.mode_name()),
        }
    }
}
