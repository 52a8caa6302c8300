// ==========================================
// 门店日结系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine/umya-spreadsheet
// 系统定位: 员工日结工作簿的结构识别与数据归集
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 网格/结构/实体
pub mod domain;

// 引擎层 - 探测/取值/写回
pub mod engine;

// 导入层 - 批量归集
pub mod importer;

// 仓储层 - 数据访问
pub mod repository;

// 接口层 - 编辑器与审计入口
pub mod api;

// 配置层 - 阈值与路径
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CellField, CellValue, CloseCashEntry, ColumnField, FieldType, MasterSnapshot, SchemaRecord,
    SheetGrid, SheetSchema, UserAccount, SOURCE_VERSION,
};

// 引擎
pub use engine::{
    extract_record, infer_type, record_to_json, try_parse_date, write_record, SchemaDetector,
};

// 导入
pub use importer::{ImportOptions, ImportOrchestrator, ImportReport};

// 仓储
pub use repository::{
    CloseCashEntryRepository, CloseCashSchemaRepository, MasterSnapshotRepository,
    RepositoryError, RepositoryResult, UpsertOutcome, UserAccountRepository,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门店日结系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
