// ==========================================
// 拼盘库存台账系统 - 生产可行性分析结果
// ==========================================
// 由库存快照 + 有效配方纯函数推导，不缓存
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{IngredientUnit, RecipeCategory};

/// 限制原料（决定最大可做份数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitingIngredient {
    pub ingredient_id: String,
    pub name: String,
    pub available: f64,
    pub required: f64, // 单份用量
}

/// 可制作配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanMakeInfo {
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: RecipeCategory,
    pub max_quantity: u64,
    pub limiting_ingredient: LimitingIngredient,
}

/// 缺料明细（shortfall 为做一份所差的量，不按份数放大）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingIngredientInfo {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub required: f64,
    pub available: f64,
    pub shortfall: f64,
    pub unit: IngredientUnit,
}

/// 不可制作配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannotMakeInfo {
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: RecipeCategory,
    pub missing_ingredients: Vec<MissingIngredientInfo>,
}

/// 生产可行性分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionAnalysis {
    pub can_make: Vec<CanMakeInfo>,
    pub cannot_make: Vec<CannotMakeInfo>,
}

/// 带统计信息的分析报告（API 输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReport {
    pub analysis: ProductionAnalysis,
    pub generated_at: NaiveDateTime,
    pub total_recipes: usize,
    pub can_make_count: usize,
    pub cannot_make_count: usize,
}
