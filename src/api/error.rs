// ==========================================
// 拼盘库存台账系统 - API层错误类型
// ==========================================
// 职责: 定义面向调用方的错误类型，将仓储层/引擎层错误转换为业务错误
// 红线: 每个错误必须携带足够上下文，调用方可据此渲染精确提示
// ==========================================

use thiserror::Error;

use crate::engine::error::{InsufficientLine, LedgerError};
use crate::repository::error::RepositoryError;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("非法状态: 当前状态 {from}，不允许执行 {action}")]
    InvalidState { from: String, action: String },

    #[error("无效数量: {0}")]
    InvalidQuantity(String),

    #[error("库存不足: {}", describe_lines(.lines))]
    InsufficientStock { lines: Vec<InsufficientLine> },

    #[error("冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储不可用: {0}")]
    DependencyUnavailable(String),

    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_lines(lines: &[InsufficientLine]) -> String {
    lines
        .iter()
        .map(|l| {
            format!(
                "{}(需要 {} {}，可用 {})",
                l.ingredient_name, l.required, l.unit, l.available
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// 错误类别代码（供调用方做分支处理）
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidState { .. } => "INVALID_STATE",
            ApiError::InvalidQuantity(_) => "INVALID_QUANTITY",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }

            // 存储基础设施故障
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DependencyUnavailable(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DependencyUnavailable(format!("数据库锁获取失败: {}", msg))
            }

            // 约束
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::OptimisticLockFailure { entity, id, expected } => {
                ApiError::Conflict(format!(
                    "{}(id={})已被并发修改（期望revision={}）",
                    entity, id, expected
                ))
            }
            RepositoryError::CheckConstraintViolation(msg) => ApiError::InvalidQuantity(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InvalidStateTransition { from, to } => ApiError::InvalidState {
                from,
                action: to,
            },

            // 数据质量
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}解析失败: {}", field, message))
            }

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 LedgerError 转换
// ==========================================
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            LedgerError::InvalidState { from, action } => ApiError::InvalidState { from, action },
            LedgerError::InvalidQuantity(msg) => ApiError::InvalidQuantity(msg),
            LedgerError::InsufficientStock(lines) => ApiError::InsufficientStock { lines },
            LedgerError::Conflict(msg) => ApiError::Conflict(msg),
            LedgerError::Config(msg) => ApiError::InternalError(format!("配置读取失败: {}", msg)),
            LedgerError::Repository(repo_err) => repo_err.into(),
        }
    }
}

impl From<Box<dyn std::error::Error>> for ApiError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        ApiError::InternalError(format!("配置读取失败: {}", err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
