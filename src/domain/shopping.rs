// ==========================================
// 拼盘库存台账系统 - 采购清单领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::IngredientUnit;

/// 生产目标：计划制作某配方若干份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionGoal {
    pub recipe_id: String,
    pub quantity: u32,
}

impl ProductionGoal {
    pub fn new(recipe_id: &str, quantity: u32) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            quantity,
        }
    }
}

/// 采购原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoppingReason {
    LowStock,
    ProductionGoal,
    Both,
}

impl ShoppingReason {
    /// 是否与生产目标相关（排序第一关键字）
    pub fn is_production_related(&self) -> bool {
        matches!(self, ShoppingReason::ProductionGoal | ShoppingReason::Both)
    }

    pub fn is_low_stock_related(&self) -> bool {
        matches!(self, ShoppingReason::LowStock | ShoppingReason::Both)
    }
}

/// 采购清单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub current_quantity: f64,
    pub needed_quantity: f64,
    pub shopping_quantity: f64,
    pub unit: IngredientUnit,
    pub reason: ShoppingReason,
    pub details: String,
}

/// 汇总计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListSummary {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub production_items: usize,
}

/// 采购清单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingListItem>,
    pub summary: ShoppingListSummary,
    /// 无法解析的配方ID（已跳过）
    pub skipped_goals: Vec<String>,
    pub generated_at: NaiveDateTime,
}
