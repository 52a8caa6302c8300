// ==========================================
// 门店日结系统 - 表结构探测配置
// ==========================================
// 职责: 模式识别的扫描上限与命中阈值
// 约束: 探测引擎不内嵌字面量,全部经由本配置传入
// ==========================================

use serde::{Deserialize, Serialize};

/// 表结构探测配置
///
/// 员工手工维护的工作簿没有固定版式，探测只能靠启发式扫描。
/// 扫描范围与命中阈值在此集中定义，便于针对不同阈值做单元测试。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 键值模式扫描的最大行数（A 列取标签、B 列取值）
    pub kv_scan_rows: u32,

    /// 判定为键值模式所需的最少标签命中行数
    pub kv_min_hits: u32,

    /// 表格模式寻找表头行的最大行数
    pub table_scan_rows: u32,

    /// 表格模式扫描的最大列数
    pub table_scan_cols: u32,

    /// 表头行判定所需的最少非空单元格数
    pub table_min_header_cells: u32,

    /// 兜底模式合成的最大字段行数
    pub fallback_rows: u32,

    /// 归一化后字段 key 的最大长度
    pub key_max_len: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            kv_scan_rows: 50,
            kv_min_hits: 5,
            table_scan_rows: 30,
            table_scan_cols: 50,
            table_min_header_cells: 2,
            fallback_rows: 10,
            key_max_len: 50,
        }
    }
}
