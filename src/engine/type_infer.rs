// ==========================================
// 门店日结系统 - 单元格类型推断
// ==========================================
// 职责: 为字段描述符标注 text/number/date 提示类型
// 说明: 推断结果只影响界面与校验提示,取值时不强制
// ==========================================

use crate::domain::{CellValue, FieldType};
use crate::engine::date_parser::try_parse_date;

/// 推断单个单元格的类型
///
/// # 规则
/// - 空值 → text
/// - 数值 → number
/// - 日期时间 → date
/// - 文本: 先试日期解析（→ date）,再去千分位逗号试浮点解析（→ number）,否则 text
pub fn infer_type(value: &CellValue) -> FieldType {
    match value {
        CellValue::Null => FieldType::Text,
        CellValue::Number(_) => FieldType::Number,
        CellValue::DateTime(_) => FieldType::Date,
        CellValue::Text(s) => {
            if try_parse_date(s).is_some() {
                FieldType::Date
            } else if s.replace(',', "").trim().parse::<f64>().is_ok() {
                FieldType::Number
            } else {
                FieldType::Text
            }
        }
    }
}
