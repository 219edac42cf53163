// ==========================================
// 拼盘库存台账系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 每种错误携带足够的结构化上下文，供调用方渲染精确提示
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::IngredientUnit;
use crate::repository::error::RepositoryError;

/// 库存不足明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientLine {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub required: f64,
    pub available: f64,
    pub unit: IngredientUnit,
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("非法状态: 当前状态 {from}，不允许执行 {action}")]
    InvalidState { from: String, action: String },

    #[error("无效数量: {0}")]
    InvalidQuantity(String),

    #[error("库存不足: {} 项原料", .0.len())]
    InsufficientStock(Vec<InsufficientLine>),

    #[error("冲突: {0}")]
    Conflict(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LedgerError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// 是否为 NotFound（含仓储层 NotFound）
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound { .. } | LedgerError::Repository(RepositoryError::NotFound { .. })
        )
    }
}

impl From<Box<dyn std::error::Error>> for LedgerError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Result 类型别名
pub type LedgerResult<T> = Result<T, LedgerError>;
