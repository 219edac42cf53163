// ==========================================
// 拼盘库存台账系统 - 配方（拼盘）领域模型
// ==========================================
// 不变量: 配方至少包含一个原料行；每行单份用量为正数
// 原料名称为快照（去规范化），不随原料改名回写
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{IngredientUnit, RecipeCategory};

/// 配方原料行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: String,
    pub ingredient_name: String,  // 名称快照
    pub quantity: f64,            // 单份用量
    pub unit: IngredientUnit,
    pub notes: Option<String>,
}

/// 配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_id: String,
    pub name: String,
    pub category: RecipeCategory,
    pub display_order: i32,
    pub ingredients: Vec<RecipeIngredient>, // 顺序即限制原料的平局顺序
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Recipe {
    /// 是否引用了指定原料
    pub fn uses_ingredient(&self, ingredient_id: &str) -> bool {
        self.ingredients
            .iter()
            .any(|line| line.ingredient_id == ingredient_id)
    }
}

/// 新建配方入参
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub category: RecipeCategory,
    #[serde(default)]
    pub display_order: i32,
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// 配方编辑入参（None 表示不修改；ingredients 提供时整体替换）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub category: Option<RecipeCategory>,
    pub display_order: Option<i32>,
    pub ingredients: Option<Vec<RecipeIngredient>>,
    pub is_active: Option<bool>,
}

/// 配方列表筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeFilter {
    pub category: Option<RecipeCategory>,
    pub is_active: Option<bool>,
}
