// ==========================================
// 拼盘库存台账系统 - 概览 API
// ==========================================
// 职责: 聚合库存/生产单/可制作配方/最近活动，供首页概览展示
// 架构: API 层 → Repository + ProductionAnalyzer（只读）
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::ApiResult;
use crate::domain::activity::ActivityRecord;
use crate::domain::recipe::RecipeFilter;
use crate::domain::types::OrderStatus;
use crate::engine::production_analyzer::ProductionAnalyzer;
use crate::i18n::{t, t_with_args};
use crate::repository::activity_log_repo::ActivityLogRepository;
use crate::repository::ingredient_repo::IngredientRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::recipe_repo::RecipeRepository;

/// 概览中最近活动的条数
pub const RECENT_ACTIVITY_LIMIT: u32 = 10;

// ==========================================
// DashboardSummary - 概览数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_ingredients: u64,
    pub low_stock_count: u64,
    pub active_orders: u64,
    pub can_make_count: usize,
    pub recent_activity: Vec<ActivityRecord>,
    /// 本地化的一句话摘要
    pub headline: String,
}

// ==========================================
// DashboardApi - 概览 API
// ==========================================
pub struct DashboardApi {
    ingredient_repo: Arc<IngredientRepository>,
    recipe_repo: Arc<RecipeRepository>,
    order_repo: Arc<OrderRepository>,
    activity_repo: Arc<ActivityLogRepository>,
}

impl DashboardApi {
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        recipe_repo: Arc<RecipeRepository>,
        order_repo: Arc<OrderRepository>,
        activity_repo: Arc<ActivityLogRepository>,
    ) -> Self {
        Self {
            ingredient_repo,
            recipe_repo,
            order_repo,
            activity_repo,
        }
    }

    /// 查询概览
    ///
    /// 低库存口径: current_quantity < low_stock_threshold（不扣除进行中生产单）
    pub fn get_summary(&self) -> ApiResult<DashboardSummary> {
        let ingredients = self.ingredient_repo.list_all()?;
        let low_stock_count = ingredients.iter().filter(|i| i.is_low_stock()).count() as u64;

        let active_orders = self
            .order_repo
            .count_by_status()?
            .get(&OrderStatus::InProgress)
            .copied()
            .unwrap_or(0);

        let recipes = self.recipe_repo.list(&RecipeFilter {
            category: None,
            is_active: Some(true),
        })?;
        let snapshot: HashMap<String, f64> = ingredients
            .iter()
            .map(|i| (i.ingredient_id.clone(), i.current_quantity))
            .collect();
        let can_make_count = ProductionAnalyzer::analyze(&recipes, &snapshot)
            .can_make
            .len();

        let recent_activity = self.activity_repo.find_recent(RECENT_ACTIVITY_LIMIT)?;

        let headline = if low_stock_count == 0 {
            t("dashboard.all_stocked")
        } else {
            t_with_args(
                "dashboard.low_stock_headline",
                &[("count", &low_stock_count.to_string())],
            )
        };

        debug!(
            total_ingredients = ingredients.len(),
            low_stock_count, active_orders, can_make_count, "概览数据已聚合"
        );

        Ok(DashboardSummary {
            total_ingredients: ingredients.len() as u64,
            low_stock_count,
            active_orders,
            can_make_count,
            recent_activity,
            headline,
        })
    }
}
