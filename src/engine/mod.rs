// ==========================================
// 门店日结系统 - 引擎层
// ==========================================
// 职责: 日期解析、类型推断、结构探测、取值、写回
// 红线: 除写回引擎外全部为纯函数,不做任何 I/O
// ==========================================

pub mod date_parser;
pub mod schema_detector;
pub mod type_infer;
pub mod value_extractor;
pub mod value_writer;

// 重导出核心引擎
pub use date_parser::try_parse_date;
pub use schema_detector::{normalize_label_key, SchemaDetector};
pub use type_infer::infer_type;
pub use value_extractor::{extract_record, record_to_json};
pub use value_writer::{write_record, WriteError};
