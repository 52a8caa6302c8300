// ==========================================
// 门店日结系统 - 接口层
// ==========================================
// 职责: 面向编辑器/审计工具的读写入口
// 红线: 不做访问控制判定,调用方（外部系统）自行裁决
// ==========================================

pub mod editor;
pub mod snapshot;

// 重导出核心接口
pub use editor::{apply_cell_changes, load_editor_grid, CellChange, EditorCell, EditorGrid};
pub use snapshot::capture_master_snapshot;
