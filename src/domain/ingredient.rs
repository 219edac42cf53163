// ==========================================
// 拼盘库存台账系统 - 原料领域模型
// ==========================================
// 不变量: current_quantity >= 0（任何违反该约束的操作在落库前被拒绝）
// 删除原料不级联到配方：配方保留失效引用
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{AdjustMode, IngredientCategory, IngredientUnit};

// ==========================================
// Ingredient - 原料（库存台账行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub ingredient_id: String,
    pub name: String,
    pub category: IngredientCategory,
    pub is_custom: bool,
    pub current_quantity: f64,
    pub unit: IngredientUnit,
    pub low_stock_threshold: f64,
    pub aliases: Vec<String>,

    // ===== 并发控制 =====
    pub revision: i64, // CAS 版本号，每次数量变更 +1

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ingredient {
    /// 当前是否处于低库存
    pub fn is_low_stock(&self) -> bool {
        self.current_quantity < self.low_stock_threshold
    }

    /// 名称或别名是否匹配（忽略大小写的包含匹配）
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .aliases
                .iter()
                .any(|a| a.to_lowercase().contains(&needle))
    }
}

/// 新建原料入参
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub category: IngredientCategory,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub current_quantity: f64,
    pub unit: IngredientUnit,
    /// 未提供时取配置 default_low_stock_threshold
    pub low_stock_threshold: Option<f64>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// 原料编辑入参（None 表示不修改）
///
/// current_quantity 不直接写库，而是走调整原语的 set 模式。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub category: Option<IngredientCategory>,
    pub is_custom: Option<bool>,
    pub current_quantity: Option<f64>,
    pub unit: Option<IngredientUnit>,
    pub low_stock_threshold: Option<f64>,
    pub aliases: Option<Vec<String>>,
}

impl IngredientPatch {
    /// 除数量外是否还有元数据变更
    pub fn has_metadata_changes(&self) -> bool {
        self.name.is_some()
            || self.category.is_some()
            || self.is_custom.is_some()
            || self.unit.is_some()
            || self.low_stock_threshold.is_some()
            || self.aliases.is_some()
    }
}

/// 原料列表筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientFilter {
    pub category: Option<IngredientCategory>,
    pub is_custom: Option<bool>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub search: Option<String>,
}

// ==========================================
// StockAdjustment - 调整原语的结果
// ==========================================
/// 单次原子调整的前后数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub mode: AdjustMode,
    pub delta: f64,
    pub old_quantity: f64,
    pub new_quantity: f64,
    pub low_stock_threshold: f64,
}

impl StockAdjustment {
    /// 是否本次调整刚好跌破低库存阈值（old >= threshold 且 new < threshold）
    pub fn crossed_low_stock(&self) -> bool {
        self.old_quantity >= self.low_stock_threshold
            && self.new_quantity < self.low_stock_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjustment(old: f64, new: f64, threshold: f64) -> StockAdjustment {
        StockAdjustment {
            ingredient_id: "I1".to_string(),
            ingredient_name: "Brie".to_string(),
            mode: AdjustMode::Set,
            delta: new,
            old_quantity: old,
            new_quantity: new,
            low_stock_threshold: threshold,
        }
    }

    #[test]
    fn test_crossed_low_stock_only_on_transition() {
        assert!(adjustment(5.0, 3.0, 4.0).crossed_low_stock());
        assert!(adjustment(4.0, 3.9, 4.0).crossed_low_stock());
        // 已经低于阈值，不重复告警
        assert!(!adjustment(3.0, 2.0, 4.0).crossed_low_stock());
        // 恰好等于阈值不算低库存
        assert!(!adjustment(6.0, 4.0, 4.0).crossed_low_stock());
        // 补货方向
        assert!(!adjustment(2.0, 8.0, 4.0).crossed_low_stock());
    }

    #[test]
    fn test_matches_search_uses_aliases() {
        let now = chrono::Local::now().naive_local();
        let ing = Ingredient {
            ingredient_id: "I1".to_string(),
            name: "Prosciutto".to_string(),
            category: IngredientCategory::Meat,
            is_custom: false,
            current_quantity: 3.0,
            unit: IngredientUnit::Oz,
            low_stock_threshold: 4.0,
            aliases: vec!["Parma Ham".to_string()],
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(ing.matches_search("prosc"));
        assert!(ing.matches_search("parma"));
        assert!(ing.matches_search("  "));
        assert!(!ing.matches_search("salami"));
        assert!(ing.is_low_stock());
    }
}
