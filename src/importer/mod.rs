// ==========================================
// 门店日结系统 - 导入层
// ==========================================
// 职责: 工作簿枚举/解析 + 身份解析 + 批量编排
// 红线: 不含 UI 逻辑,所有数据库操作经由仓储层
// ==========================================

pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod workbook_files;
pub mod workbook_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use identity::resolve_workbook_owner;
pub use orchestrator::{ImportOptions, ImportOrchestrator, ImportReport, SkippedFile};
pub use workbook_files::{list_employee_workbooks, validate_filename, workbook_stem};
pub use workbook_parser::{read_workbook, ParsedWorkbook};
