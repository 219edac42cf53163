// ==========================================
// 拼盘库存台账系统 - 活动日志领域模型
// ==========================================
// 红线: 只追加，不修改、不删除
// 负载按事件类型区分（标签联合），每种事件一个变体
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::types::AdjustMode;

// ==========================================
// ActivityType - 事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    IngredientAdjustment,
    IngredientCreated,
    IngredientDeleted,
    OrderCreated,
    OrderCompleted,
    OrderCancelled,
    LowStockAlert,
}

impl ActivityType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::IngredientAdjustment => "ingredient_adjustment",
            ActivityType::IngredientCreated => "ingredient_created",
            ActivityType::IngredientDeleted => "ingredient_deleted",
            ActivityType::OrderCreated => "order_created",
            ActivityType::OrderCompleted => "order_completed",
            ActivityType::OrderCancelled => "order_cancelled",
            ActivityType::LowStockAlert => "low_stock_alert",
        }
    }

    /// 从字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ingredient_adjustment" => Some(ActivityType::IngredientAdjustment),
            "ingredient_created" => Some(ActivityType::IngredientCreated),
            "ingredient_deleted" => Some(ActivityType::IngredientDeleted),
            "order_created" => Some(ActivityType::OrderCreated),
            "order_completed" => Some(ActivityType::OrderCompleted),
            "order_cancelled" => Some(ActivityType::OrderCancelled),
            "low_stock_alert" => Some(ActivityType::LowStockAlert),
            _ => None,
        }
    }
}

// ==========================================
// ActivityPayload - 事件负载
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityPayload {
    IngredientAdjustment {
        ingredient_id: String,
        ingredient_name: String,
        old_quantity: f64,
        new_quantity: f64,
        adjustment: f64,
        mode: AdjustMode,
    },
    IngredientCreated {
        ingredient_id: String,
        ingredient_name: String,
        initial_quantity: f64,
    },
    IngredientDeleted {
        ingredient_id: String,
        ingredient_name: String,
    },
    OrderCreated {
        order_id: String,
        order_number: String,
        recipe_name: String,
        order_quantity: u32,
    },
    OrderCompleted {
        order_id: String,
        order_number: String,
        recipe_name: String,
        order_quantity: u32,
    },
    OrderCancelled {
        order_id: String,
        order_number: String,
        recipe_name: String,
        order_quantity: u32,
    },
    LowStockAlert {
        ingredient_id: String,
        ingredient_name: String,
        current_quantity: f64,
        threshold: f64,
    },
}

impl ActivityPayload {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityPayload::IngredientAdjustment { .. } => ActivityType::IngredientAdjustment,
            ActivityPayload::IngredientCreated { .. } => ActivityType::IngredientCreated,
            ActivityPayload::IngredientDeleted { .. } => ActivityType::IngredientDeleted,
            ActivityPayload::OrderCreated { .. } => ActivityType::OrderCreated,
            ActivityPayload::OrderCompleted { .. } => ActivityType::OrderCompleted,
            ActivityPayload::OrderCancelled { .. } => ActivityType::OrderCancelled,
            ActivityPayload::LowStockAlert { .. } => ActivityType::LowStockAlert,
        }
    }

    /// 关联原料ID（用于筛选列）
    pub fn ingredient_id(&self) -> Option<&str> {
        match self {
            ActivityPayload::IngredientAdjustment { ingredient_id, .. }
            | ActivityPayload::IngredientCreated { ingredient_id, .. }
            | ActivityPayload::IngredientDeleted { ingredient_id, .. }
            | ActivityPayload::LowStockAlert { ingredient_id, .. } => Some(ingredient_id),
            _ => None,
        }
    }

    /// 关联生产单ID（用于筛选列）
    pub fn order_id(&self) -> Option<&str> {
        match self {
            ActivityPayload::OrderCreated { order_id, .. }
            | ActivityPayload::OrderCompleted { order_id, .. }
            | ActivityPayload::OrderCancelled { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}

// ==========================================
// ActivityRecord - 活动记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: String,
    pub payload: ActivityPayload,
    pub activity_ts: NaiveDateTime,
    pub metadata: Option<JsonValue>,
}

impl ActivityRecord {
    /// 以当前时间创建活动记录
    pub fn new(payload: ActivityPayload) -> Self {
        Self {
            activity_id: uuid::Uuid::new_v4().to_string(),
            payload,
            activity_ts: chrono::Local::now().naive_local(),
            metadata: None,
        }
    }

    /// 附加元数据 (转换为JSON)
    pub fn with_metadata<T: Serialize>(mut self, metadata: &T) -> Self {
        self.metadata = serde_json::to_value(metadata).ok();
        self
    }

    pub fn activity_type(&self) -> ActivityType {
        self.payload.activity_type()
    }
}

// ==========================================
// 查询条件与分页
// ==========================================

/// 活动日志筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub activity_type: Option<ActivityType>,
    pub ingredient_id: Option<String>,
    pub order_id: Option<String>,
    /// 起始日期（含当天 00:00:00）
    pub start_date: Option<NaiveDate>,
    /// 截止日期（含当天 23:59:59.999999）
    pub end_date: Option<NaiveDate>,
}

/// 分页参数（page 从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPage {
    pub records: Vec<ActivityRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl ActivityPage {
    pub fn new(records: Vec<ActivityRecord>, pagination: Pagination, total: u64) -> Self {
        let limit = u64::from(pagination.limit.max(1));
        Self {
            records,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}
