// ==========================================
// 门店日结系统 - 用户账户（身份解析接口面）
// ==========================================
// 说明: 认证/授权属于外部系统,这里只保留
//       按文件名解析工作簿归属所需的最小字段
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,              // 用户 ID（UUID）
    pub username: String,             // 用户名（与工作簿文件名主干大小写不敏感匹配）
    pub display_name: Option<String>, // 显示名
    pub is_active: bool,              // 是否在职
    pub created_at: DateTime<Utc>,    // 创建时间
}

impl UserAccount {
    /// 创建新账户（自动生成 UUID 与时间戳）
    pub fn new(username: &str, display_name: Option<&str>) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: display_name.map(|s| s.to_string()),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
