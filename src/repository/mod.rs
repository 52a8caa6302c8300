// ==========================================
// 门店日结系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod entry_repo;
pub mod error;
pub mod schema_repo;
pub mod snapshot_repo;
pub mod user_repo;

// 重导出核心仓储
pub use entry_repo::CloseCashEntryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use schema_repo::{CloseCashSchemaRepository, UpsertOutcome};
pub use snapshot_repo::MasterSnapshotRepository;
pub use user_repo::UserAccountRepository;
