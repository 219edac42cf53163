// ==========================================
// 拼盘库存台账系统 - 生产可行性分析引擎
// ==========================================
// 职责: 基于库存快照判定每个配方能否制作、最多做几份、受哪种原料限制
// 红线: 纯函数，无副作用，不缓存；结果只取决于传入的快照
// ==========================================
// 规则:
// - possible_units = floor(available / per_unit)，不做四舍五入
// - 配方可做份数 = 所有原料 possible_units 的最小值
// - 限制原料取配方原料顺序中第一个达到最小值的原料
// - possible_units == 0 的原料计入缺料清单，shortfall = per_unit - available（单份口径）
// ==========================================

use std::collections::HashMap;

use tracing::debug;

use crate::domain::production::{
    CanMakeInfo, CannotMakeInfo, LimitingIngredient, MissingIngredientInfo, ProductionAnalysis,
    ProductionReport,
};
use crate::domain::recipe::Recipe;

// ==========================================
// ProductionAnalyzer - 生产分析器
// ==========================================
pub struct ProductionAnalyzer;

impl ProductionAnalyzer {
    /// 分析全部启用配方
    ///
    /// # 参数
    /// - recipes: 配方列表（按展示顺序传入，输出保持该顺序）
    /// - snapshot: 原料ID → 当前数量；快照中缺失的原料按 0 计
    pub fn analyze(recipes: &[Recipe], snapshot: &HashMap<String, f64>) -> ProductionAnalysis {
        let mut analysis = ProductionAnalysis::default();

        for recipe in recipes.iter().filter(|r| r.is_active) {
            match Self::evaluate_recipe(recipe, snapshot) {
                Ok(can_make) => analysis.can_make.push(can_make),
                Err(cannot_make) => analysis.cannot_make.push(cannot_make),
            }
        }

        debug!(
            can_make = analysis.can_make.len(),
            cannot_make = analysis.cannot_make.len(),
            "生产可行性分析完成"
        );
        analysis
    }

    /// 生成带统计信息的分析报告
    pub fn report(recipes: &[Recipe], snapshot: &HashMap<String, f64>) -> ProductionReport {
        let analysis = Self::analyze(recipes, snapshot);
        let total_recipes = analysis.can_make.len() + analysis.cannot_make.len();
        ProductionReport {
            can_make_count: analysis.can_make.len(),
            cannot_make_count: analysis.cannot_make.len(),
            total_recipes,
            analysis,
            generated_at: chrono::Local::now().naive_local(),
        }
    }

    /// 单个配方的判定
    pub fn evaluate_recipe(
        recipe: &Recipe,
        snapshot: &HashMap<String, f64>,
    ) -> Result<CanMakeInfo, CannotMakeInfo> {
        let mut limiting: Option<(u64, LimitingIngredient)> = None;
        let mut missing: Vec<MissingIngredientInfo> = Vec::new();

        for line in &recipe.ingredients {
            let available = snapshot
                .get(&line.ingredient_id)
                .copied()
                .unwrap_or(0.0)
                .max(0.0);
            let possible = possible_units(available, line.quantity);

            if possible == 0 {
                missing.push(MissingIngredientInfo {
                    ingredient_id: line.ingredient_id.clone(),
                    ingredient_name: line.ingredient_name.clone(),
                    required: line.quantity,
                    available,
                    shortfall: line.quantity - available,
                    unit: line.unit,
                });
            }

            // 严格小于才替换：平局保留先出现的原料
            let replace = match &limiting {
                Some((current_min, _)) => possible < *current_min,
                None => true,
            };
            if replace {
                limiting = Some((
                    possible,
                    LimitingIngredient {
                        ingredient_id: line.ingredient_id.clone(),
                        name: line.ingredient_name.clone(),
                        available,
                        required: line.quantity,
                    },
                ));
            }
        }

        match limiting {
            Some((max_quantity, limiting_ingredient)) if max_quantity > 0 => Ok(CanMakeInfo {
                recipe_id: recipe.recipe_id.clone(),
                recipe_name: recipe.name.clone(),
                category: recipe.category,
                max_quantity,
                limiting_ingredient,
            }),
            _ => Err(CannotMakeInfo {
                recipe_id: recipe.recipe_id.clone(),
                recipe_name: recipe.name.clone(),
                category: recipe.category,
                missing_ingredients: missing,
            }),
        }
    }
}

/// floor(available / per_unit)；单份用量非正时视为不可制作
fn possible_units(available: f64, per_unit: f64) -> u64 {
    if per_unit.is_nan() || per_unit <= 0.0 || !available.is_finite() {
        return 0;
    }
    (available / per_unit).floor() as u64
}
