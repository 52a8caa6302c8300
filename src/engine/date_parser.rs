// ==========================================
// 门店日结系统 - 日期解析器
// ==========================================
// 职责: 把表名/单元格里的各种手写日期串解析为 NaiveDate
// 红线: 字面格式的先后顺序即歧义裁决顺序（日先于月）,不得调整
// ==========================================

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// 字面格式清单,按优先级排列
///
/// `03-04-2025` 这类串会同时命中日先/月先两种读法,谁排在前谁生效。
/// 现行顺序沿袭既有数据的口径（日先）,在拿到业务侧结论之前不做“修正”。
const LITERAL_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// 年先兜底: 2025.10.23 / 2025-10-23 / 2025/10/23
fn year_first_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})[./-](\d{1,2})[./-](\d{1,2})$").expect("硬编码正则")
    })
}

/// 日先兜底: 23.10.2025 / 23-10-2025 / 23/10/2025
fn day_first_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{4})$").expect("硬编码正则")
    })
}

/// 尝试把字符串解析为日期
///
/// # 解析顺序
/// 1. 10 个字面格式,按 LITERAL_FORMATS 的先后逐一尝试
/// 2. 年先正则兜底（点/横线/斜线分隔）
/// 3. 日先正则兜底
///
/// # 返回
/// - Some(date): 第一个命中的读法
/// - None: 全部未命中（含空串、非法日期数值）; 永不报错
pub fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in LITERAL_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    if let Some(caps) = year_first_pattern().captures(trimmed) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = day_first_pattern().captures(trimmed) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    None
}
