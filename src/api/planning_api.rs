// ==========================================
// 拼盘库存台账系统 - 生产计划 API
// ==========================================
// 职责: 生产可行性分析、采购清单生成
// 红线: 只读快照，不持有原料锁；结果可能在返回时已过期
// ==========================================

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::api::error::ApiResult;
use crate::domain::production::ProductionReport;
use crate::domain::recipe::RecipeFilter;
use crate::domain::shopping::{ProductionGoal, ShoppingList};
use crate::engine::production_analyzer::ProductionAnalyzer;
use crate::engine::shopping_list::ShoppingListGenerator;
use crate::repository::ingredient_repo::IngredientRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::recipe_repo::RecipeRepository;

// ==========================================
// PlanningApi - 生产计划 API
// ==========================================
pub struct PlanningApi {
    ingredient_repo: Arc<IngredientRepository>,
    recipe_repo: Arc<RecipeRepository>,
    order_repo: Arc<OrderRepository>,
}

impl PlanningApi {
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        recipe_repo: Arc<RecipeRepository>,
        order_repo: Arc<OrderRepository>,
    ) -> Self {
        Self {
            ingredient_repo,
            recipe_repo,
            order_repo,
        }
    }

    /// 分析全部启用配方的可制作份数
    ///
    /// 配方按分类、展示顺序分析；原料数量取调用时刻的快照
    #[instrument(skip(self))]
    pub fn analyze_production(&self) -> ApiResult<ProductionReport> {
        let recipes = self.recipe_repo.list(&RecipeFilter {
            category: None,
            is_active: Some(true),
        })?;
        let snapshot = self.ingredient_repo.quantity_snapshot()?;

        let report = ProductionAnalyzer::report(&recipes, &snapshot);
        debug!(
            total = report.total_recipes,
            can_make = report.can_make_count,
            "生产分析报告已生成"
        );
        Ok(report)
    }

    /// 生成采购清单
    ///
    /// # 参数
    /// - include_low_stock: 是否包含低库存补货行
    /// - goals: 生产目标（配方ID + 份数）；未知配方ID在 skipped_goals 中返回
    #[instrument(skip(self, goals), fields(goals = goals.len()))]
    pub fn generate_shopping_list(
        &self,
        include_low_stock: bool,
        goals: &[ProductionGoal],
    ) -> ApiResult<ShoppingList> {
        let ingredients = self.ingredient_repo.list_all()?;
        let recipes = self.recipe_repo.list_all()?;
        let orders = self.order_repo.list_in_progress()?;

        Ok(ShoppingListGenerator::generate(
            &ingredients,
            &recipes,
            &orders,
            include_low_stock,
            goals,
        ))
    }
}
