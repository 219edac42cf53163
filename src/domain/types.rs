// ==========================================
// 拼盘库存台账系统 - 领域类型定义
// ==========================================
// 职责: 原料分类/单位、配方分类、生产单状态、调整模式等枚举
// 序列化: 对外 JSON 使用 snake_case / 原始标签，数据库存储使用 as_str()
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 原料分类 (Ingredient Category)
// ==========================================
// 仅作信息展示/筛选用途，不参与计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IngredientCategory {
    Cheese,
    Meat,
    Fruit,
    Vegetable,
    Crackers,
    Nuts,
    Spreads,
    Sweets,
    Garnish,
    Bread,
    #[default]
    Other,
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Cheese => "Cheese",
            IngredientCategory::Meat => "Meat",
            IngredientCategory::Fruit => "Fruit",
            IngredientCategory::Vegetable => "Vegetable",
            IngredientCategory::Crackers => "Crackers",
            IngredientCategory::Nuts => "Nuts",
            IngredientCategory::Spreads => "Spreads",
            IngredientCategory::Sweets => "Sweets",
            IngredientCategory::Garnish => "Garnish",
            IngredientCategory::Bread => "Bread",
            IngredientCategory::Other => "Other",
        }
    }

    /// 从数据库字符串解析，未知值归入 Other
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "Cheese" => IngredientCategory::Cheese,
            "Meat" => IngredientCategory::Meat,
            "Fruit" => IngredientCategory::Fruit,
            "Vegetable" => IngredientCategory::Vegetable,
            "Crackers" => IngredientCategory::Crackers,
            "Nuts" => IngredientCategory::Nuts,
            "Spreads" => IngredientCategory::Spreads,
            "Sweets" => IngredientCategory::Sweets,
            "Garnish" => IngredientCategory::Garnish,
            "Bread" => IngredientCategory::Bread,
            _ => IngredientCategory::Other,
        }
    }
}

impl fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 计量单位 (Unit)
// ==========================================
// 不做单位换算：同一原料的库存与配方用量视为同一单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientUnit {
    Oz,
    Each,
    Slices,
    Cups,
    Container,
    Wedges,
    Stalks,
    Lb,
    G,
}

impl IngredientUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientUnit::Oz => "oz",
            IngredientUnit::Each => "each",
            IngredientUnit::Slices => "slices",
            IngredientUnit::Cups => "cups",
            IngredientUnit::Container => "container",
            IngredientUnit::Wedges => "wedges",
            IngredientUnit::Stalks => "stalks",
            IngredientUnit::Lb => "lb",
            IngredientUnit::G => "g",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "oz" => Some(IngredientUnit::Oz),
            "each" => Some(IngredientUnit::Each),
            "slices" => Some(IngredientUnit::Slices),
            "cups" => Some(IngredientUnit::Cups),
            "container" => Some(IngredientUnit::Container),
            "wedges" => Some(IngredientUnit::Wedges),
            "stalks" => Some(IngredientUnit::Stalks),
            "lb" => Some(IngredientUnit::Lb),
            "g" => Some(IngredientUnit::G),
            _ => None,
        }
    }
}

impl fmt::Display for IngredientUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 配方分类 (Recipe Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecipeCategory {
    Classic,
    Vegetarian,
    Sweet,
    Keto,
    Specialty,
}

impl RecipeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeCategory::Classic => "Classic",
            RecipeCategory::Vegetarian => "Vegetarian",
            RecipeCategory::Sweet => "Sweet",
            RecipeCategory::Keto => "Keto",
            RecipeCategory::Specialty => "Specialty",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Classic" => Some(RecipeCategory::Classic),
            "Vegetarian" => Some(RecipeCategory::Vegetarian),
            "Sweet" => Some(RecipeCategory::Sweet),
            "Keto" => Some(RecipeCategory::Keto),
            "Specialty" => Some(RecipeCategory::Specialty),
            _ => None,
        }
    }
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 生产单状态 (Order Status)
// ==========================================
// 状态机: IN_PROGRESS --complete--> COMPLETED
//         IN_PROGRESS --cancel-->   CANCELLED
// 两个终态互斥，终态不再有任何出边
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 数据库存储格式
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(OrderStatus::InProgress),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::InProgress)
    }

    /// 判断状态转换是否合法
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 库存调整模式 (Adjust Mode)
// ==========================================
// increment → current + delta
// decrement → current - delta
// set       → delta (目标值)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustMode {
    Increment,
    Decrement,
    Set,
}

impl AdjustMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustMode::Increment => "increment",
            AdjustMode::Decrement => "decrement",
            AdjustMode::Set => "set",
        }
    }

    /// 计算目标数量（不做非负校验）
    pub fn resolve(&self, current: f64, delta: f64) -> f64 {
        match self {
            AdjustMode::Increment => current + delta,
            AdjustMode::Decrement => current - delta,
            AdjustMode::Set => delta,
        }
    }
}

impl fmt::Display for AdjustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_mode_resolve() {
        assert_eq!(AdjustMode::Increment.resolve(10.0, 2.5), 12.5);
        assert_eq!(AdjustMode::Decrement.resolve(10.0, 2.5), 7.5);
        assert_eq!(AdjustMode::Set.resolve(10.0, 2.5), 2.5);
        assert!(AdjustMode::Decrement.resolve(1.0, 2.0) < 0.0);
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_db_str_round_trip_for_status() {
        for status in [
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_db_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_db_str("DONE"), None);
    }

    #[test]
    fn test_unknown_category_falls_back_to_other() {
        assert_eq!(IngredientCategory::from_db_str("Pickles"), IngredientCategory::Other);
        assert_eq!(IngredientUnit::from_db_str("kg"), None);
    }

    #[test]
    fn test_order_status_json_uses_kebab_case() {
        let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
