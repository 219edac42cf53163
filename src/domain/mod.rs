// ==========================================
// 拼盘库存台账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、查询条件
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod activity;
pub mod ingredient;
pub mod order;
pub mod production;
pub mod recipe;
pub mod shopping;
pub mod types;

// 重导出核心类型
pub use activity::{
    ActivityFilter, ActivityPage, ActivityPayload, ActivityRecord, ActivityType, Pagination,
};
pub use ingredient::{Ingredient, IngredientFilter, IngredientPatch, NewIngredient, StockAdjustment};
pub use order::{DebitedIngredient, OrderFilter, OrderNumber, ProductionOrder};
pub use production::{
    CanMakeInfo, CannotMakeInfo, LimitingIngredient, MissingIngredientInfo, ProductionAnalysis,
    ProductionReport,
};
pub use recipe::{NewRecipe, Recipe, RecipeFilter, RecipeIngredient, RecipePatch};
pub use shopping::{
    ProductionGoal, ShoppingList, ShoppingListItem, ShoppingListSummary, ShoppingReason,
};
pub use types::{AdjustMode, IngredientCategory, IngredientUnit, OrderStatus, RecipeCategory};
