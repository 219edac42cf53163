// ==========================================
// 拼盘库存台账系统 - 采购清单生成引擎
// ==========================================
// 职责: 合并"低库存补货"与"生产目标缺口"两类需求，输出去重、排序后的采购清单
// 红线: 纯计算，不修改库存
// ==========================================
// 步骤:
// 1. available = max(0, current - 进行中生产单已扣减量)
// 2. 低库存行: available < threshold → 采购 threshold - available
// 3. 生产目标行: 累计 per_unit × 份数，needed > available → 采购 needed - available
//    与低库存行合并时 needed/shopping 取较大值，原因记为 both
// 4. 排序: 与生产相关的行在前，其次按名称（忽略大小写）
// ==========================================

use std::collections::HashMap;

use tracing::debug;

use crate::domain::ingredient::Ingredient;
use crate::domain::order::ProductionOrder;
use crate::domain::recipe::Recipe;
use crate::domain::shopping::{
    ProductionGoal, ShoppingList, ShoppingListItem, ShoppingListSummary, ShoppingReason,
};
use crate::domain::types::OrderStatus;
use crate::i18n::{format_quantity, t_with_args};

/// 生产目标对单个原料的累计需求
#[derive(Debug, Default)]
struct GoalDemand {
    needed: f64,
    recipe_names: Vec<String>,
}

// ==========================================
// ShoppingListGenerator - 采购清单生成器
// ==========================================
pub struct ShoppingListGenerator;

impl ShoppingListGenerator {
    /// 生成采购清单
    ///
    /// # 参数
    /// - ingredients: 全部原料快照
    /// - recipes: 全部配方（用于解析生产目标）
    /// - orders: 生产单（仅 IN_PROGRESS 计入预留）
    /// - include_low_stock: 是否包含低库存补货行
    /// - goals: 生产目标；无法解析的配方ID记入 skipped_goals
    pub fn generate(
        ingredients: &[Ingredient],
        recipes: &[Recipe],
        orders: &[ProductionOrder],
        include_low_stock: bool,
        goals: &[ProductionGoal],
    ) -> ShoppingList {
        let available = Self::available_quantities(ingredients, orders);
        let by_id: HashMap<&str, &Ingredient> = ingredients
            .iter()
            .map(|ing| (ing.ingredient_id.as_str(), ing))
            .collect();

        let mut items: Vec<ShoppingListItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        // ===== 低库存行 =====
        if include_low_stock {
            for ing in ingredients {
                let avail = available.get(&ing.ingredient_id).copied().unwrap_or(0.0);
                if avail < ing.low_stock_threshold {
                    index.insert(ing.ingredient_id.clone(), items.len());
                    items.push(ShoppingListItem {
                        ingredient_id: ing.ingredient_id.clone(),
                        ingredient_name: ing.name.clone(),
                        current_quantity: ing.current_quantity,
                        needed_quantity: ing.low_stock_threshold,
                        shopping_quantity: ing.low_stock_threshold - avail,
                        unit: ing.unit,
                        reason: ShoppingReason::LowStock,
                        details: low_stock_detail(avail, ing.low_stock_threshold),
                    });
                }
            }
        }

        // ===== 生产目标累计 =====
        let (demands, order_of_first_seen, skipped_goals) =
            Self::accumulate_goal_demand(recipes, goals);

        for ingredient_id in order_of_first_seen {
            let Some(ing) = by_id.get(ingredient_id.as_str()) else {
                debug!(ingredient_id = %ingredient_id, "生产目标引用的原料已不存在，跳过");
                continue;
            };
            let Some(demand) = demands.get(&ingredient_id) else {
                continue;
            };
            let avail = available.get(&ingredient_id).copied().unwrap_or(0.0);
            if demand.needed <= avail {
                continue;
            }
            let shortfall = demand.needed - avail;
            let production_detail = production_detail(demand.needed, &demand.recipe_names);

            match index.get(&ingredient_id) {
                Some(&pos) => {
                    let item = &mut items[pos];
                    item.needed_quantity = item.needed_quantity.max(demand.needed);
                    item.shopping_quantity = item.shopping_quantity.max(shortfall);
                    item.reason = ShoppingReason::Both;
                    item.details = both_detail(&item.details, &production_detail);
                }
                None => {
                    index.insert(ingredient_id.clone(), items.len());
                    items.push(ShoppingListItem {
                        ingredient_id: ing.ingredient_id.clone(),
                        ingredient_name: ing.name.clone(),
                        current_quantity: ing.current_quantity,
                        needed_quantity: demand.needed,
                        shopping_quantity: shortfall,
                        unit: ing.unit,
                        reason: ShoppingReason::ProductionGoal,
                        details: production_detail,
                    });
                }
            }
        }

        Self::sort_items(&mut items);
        let summary = summarize(&items);

        debug!(
            total = summary.total_items,
            low_stock = summary.low_stock_items,
            production = summary.production_items,
            skipped = skipped_goals.len(),
            "采购清单已生成"
        );

        ShoppingList {
            items,
            summary,
            skipped_goals,
            generated_at: chrono::Local::now().naive_local(),
        }
    }

    /// 可用数量 = max(0, 当前数量 - 进行中生产单已扣减量)
    pub fn available_quantities(
        ingredients: &[Ingredient],
        orders: &[ProductionOrder],
    ) -> HashMap<String, f64> {
        let mut reserved: HashMap<&str, f64> = HashMap::new();
        for order in orders.iter().filter(|o| o.status == OrderStatus::InProgress) {
            for debit in &order.debited_ingredients {
                *reserved.entry(debit.ingredient_id.as_str()).or_insert(0.0) +=
                    debit.quantity_debited;
            }
        }

        ingredients
            .iter()
            .map(|ing| {
                let held = reserved
                    .get(ing.ingredient_id.as_str())
                    .copied()
                    .unwrap_or(0.0);
                (
                    ing.ingredient_id.clone(),
                    (ing.current_quantity - held).max(0.0),
                )
            })
            .collect()
    }

    /// 排序: 生产相关在前，其次名称忽略大小写，最后按原始名称稳定
    pub fn sort_items(items: &mut [ShoppingListItem]) {
        items.sort_by(|a, b| {
            b.reason
                .is_production_related()
                .cmp(&a.reason.is_production_related())
                .then_with(|| {
                    a.ingredient_name
                        .to_lowercase()
                        .cmp(&b.ingredient_name.to_lowercase())
                })
                .then_with(|| a.ingredient_name.cmp(&b.ingredient_name))
        });
    }

    /// 汇总全部生产目标的原料需求
    ///
    /// # 返回
    /// - 原料ID → 累计需求
    /// - 原料ID首次出现顺序
    /// - 无法解析的配方ID
    fn accumulate_goal_demand(
        recipes: &[Recipe],
        goals: &[ProductionGoal],
    ) -> (HashMap<String, GoalDemand>, Vec<String>, Vec<String>) {
        let recipes_by_id: HashMap<&str, &Recipe> =
            recipes.iter().map(|r| (r.recipe_id.as_str(), r)).collect();

        let mut demands: HashMap<String, GoalDemand> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        for goal in goals {
            let Some(recipe) = recipes_by_id.get(goal.recipe_id.as_str()) else {
                if !skipped.contains(&goal.recipe_id) {
                    skipped.push(goal.recipe_id.clone());
                }
                continue;
            };
            if goal.quantity == 0 {
                continue;
            }

            for line in &recipe.ingredients {
                let demand = demands.entry(line.ingredient_id.clone()).or_insert_with(|| {
                    first_seen.push(line.ingredient_id.clone());
                    GoalDemand::default()
                });
                demand.needed += line.quantity * f64::from(goal.quantity);
                if !demand.recipe_names.contains(&recipe.name) {
                    demand.recipe_names.push(recipe.name.clone());
                }
            }
        }

        (demands, first_seen, skipped)
    }
}

fn summarize(items: &[ShoppingListItem]) -> ShoppingListSummary {
    ShoppingListSummary {
        total_items: items.len(),
        low_stock_items: items
            .iter()
            .filter(|i| i.reason.is_low_stock_related())
            .count(),
        production_items: items
            .iter()
            .filter(|i| i.reason.is_production_related())
            .count(),
    }
}

// ==========================================
// 明细文案
// ==========================================

fn low_stock_detail(available: f64, threshold: f64) -> String {
    t_with_args(
        "shopping.low_stock_detail",
        &[
            ("available", &format_quantity(available)),
            ("threshold", &format_quantity(threshold)),
        ],
    )
}

fn production_detail(needed: f64, recipe_names: &[String]) -> String {
    t_with_args(
        "shopping.production_detail",
        &[
            ("needed", &format_quantity(needed)),
            ("recipes", &recipe_names.join(", ")),
        ],
    )
}

fn both_detail(low_stock: &str, production: &str) -> String {
    t_with_args(
        "shopping.both_detail",
        &[("low_stock", low_stock), ("production", production)],
    )
}
