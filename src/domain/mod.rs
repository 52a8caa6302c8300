// ==========================================
// 门店日结系统 - 领域层
// ==========================================
// 职责: 网格模型、表结构描述、日结条目与快照实体
// 红线: 领域类型不做任何 I/O,不依赖仓储与引擎
// ==========================================

pub mod entry;
pub mod grid;
pub mod schema;
pub mod user;

// 重导出核心类型
pub use entry::{CloseCashEntry, MasterSnapshot, SOURCE_VERSION};
pub use grid::{CellValue, SheetGrid};
pub use schema::{CellField, ColumnField, FieldType, SchemaRecord, SheetSchema};
pub use user::UserAccount;
