// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use board_ledger::domain::{Ingredient, NewIngredient, NewRecipe, RecipeIngredient};
use board_ledger::{IngredientCategory, IngredientUnit, RecipeCategory};

// ==========================================
// NewIngredient 构建器
// ==========================================

pub struct IngredientBuilder {
    name: String,
    category: IngredientCategory,
    is_custom: bool,
    current_quantity: f64,
    unit: IngredientUnit,
    low_stock_threshold: Option<f64>,
    aliases: Vec<String>,
}

impl IngredientBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: IngredientCategory::Other,
            is_custom: false,
            current_quantity: 0.0,
            unit: IngredientUnit::Oz,
            low_stock_threshold: None,
            aliases: Vec::new(),
        }
    }

    pub fn category(mut self, category: IngredientCategory) -> Self {
        self.category = category;
        self
    }

    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.current_quantity = quantity;
        self
    }

    pub fn unit(mut self, unit: IngredientUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn build(self) -> NewIngredient {
        NewIngredient {
            name: self.name,
            category: self.category,
            is_custom: self.is_custom,
            current_quantity: self.current_quantity,
            unit: self.unit,
            low_stock_threshold: self.low_stock_threshold,
            aliases: self.aliases,
        }
    }
}

// ==========================================
// NewRecipe 构建器
// ==========================================

pub struct RecipeBuilder {
    name: String,
    category: RecipeCategory,
    display_order: i32,
    ingredients: Vec<RecipeIngredient>,
    is_active: bool,
}

impl RecipeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: RecipeCategory::Classic,
            display_order: 0,
            ingredients: Vec::new(),
            is_active: true,
        }
    }

    pub fn category(mut self, category: RecipeCategory) -> Self {
        self.category = category;
        self
    }

    pub fn display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }

    /// 追加一行原料（名称快照取自原料当前名称）
    pub fn line(mut self, ingredient: &Ingredient, per_unit: f64) -> Self {
        self.ingredients.push(RecipeIngredient {
            ingredient_id: ingredient.ingredient_id.clone(),
            ingredient_name: ingredient.name.clone(),
            quantity: per_unit,
            unit: ingredient.unit,
            notes: None,
        });
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> NewRecipe {
        NewRecipe {
            name: self.name,
            category: self.category,
            display_order: self.display_order,
            ingredients: self.ingredients,
            is_active: self.is_active,
        }
    }
}
