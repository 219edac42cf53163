// ==========================================
// 拼盘库存台账系统 - 生产单领域模型
// ==========================================
// 生产单在创建时一次性扣减原料，并快照扣减明细
// 单号格式: <PREFIX>-<YEAR>-<SEQ>，SEQ 至少 3 位补零，按年递增且不复用
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{IngredientUnit, OrderStatus};

/// 扣减明细（创建时快照，取消时据此回补）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitedIngredient {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub quantity_debited: f64, // = 单份用量 × 生产单数量
    pub unit: IngredientUnit,
}

/// 生产单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub order_id: String,
    pub order_number: String,
    pub recipe_id: String,
    pub recipe_name: String, // 名称快照
    pub quantity: u32,
    pub status: OrderStatus,
    pub debited_ingredients: Vec<DebitedIngredient>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
}

/// 生产单列表筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// 创建日期起（含当天 00:00:00）
    pub start_date: Option<NaiveDate>,
    /// 创建日期止（含当天 23:59:59.999999）
    pub end_date: Option<NaiveDate>,
}

// ==========================================
// OrderNumber - 单号
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNumber {
    pub prefix: String,
    pub year: i32,
    pub sequence: u32,
}

impl OrderNumber {
    pub fn new(prefix: &str, year: i32, sequence: u32) -> Self {
        Self {
            prefix: prefix.to_string(),
            year,
            sequence,
        }
    }

    /// 解析形如 ORD-2025-007 的单号
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.rsplitn(3, '-');
        let sequence = parts.next()?.parse::<u32>().ok()?;
        let year = parts.next()?.parse::<i32>().ok()?;
        let prefix = parts.next()?;
        if prefix.is_empty() {
            return None;
        }
        Some(Self::new(prefix, year, sequence))
    }

    /// 按年份内已用最大序号生成下一个单号
    pub fn next_after(prefix: &str, year: i32, last_sequence: Option<u32>) -> Self {
        Self::new(prefix, year, last_sequence.unwrap_or(0) + 1)
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{:03}", self.prefix, self.year, self.sequence)
    }
}
