// ==========================================
// 拼盘库存台账系统 - 原料 API
// ==========================================
// 职责: 原料查询、增删改、库存调整
// 红线: 库存数量只经由 StockLedger 调整原语变更
// ==========================================

use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_name;
use crate::config::config_manager::ConfigManager;
use crate::domain::ingredient::{
    Ingredient, IngredientFilter, IngredientPatch, NewIngredient, StockAdjustment,
};
use crate::domain::recipe::Recipe;
use crate::domain::types::AdjustMode;
use crate::engine::ledger::StockLedger;
use crate::repository::ingredient_repo::IngredientRepository;
use crate::repository::recipe_repo::RecipeRepository;

// ==========================================
// IngredientApi - 原料 API
// ==========================================

/// 原料API
///
/// 职责：
/// 1. 原料查询（单个/过滤列表）
/// 2. 原料新建、编辑、删除
/// 3. 库存调整（increment / decrement / set）
/// 4. 反查引用该原料的配方
pub struct IngredientApi {
    ingredient_repo: Arc<IngredientRepository>,
    recipe_repo: Arc<RecipeRepository>,
    ledger: Arc<StockLedger<ConfigManager>>,
}

impl IngredientApi {
    /// 创建新的IngredientApi实例
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        recipe_repo: Arc<RecipeRepository>,
        ledger: Arc<StockLedger<ConfigManager>>,
    ) -> Self {
        Self {
            ingredient_repo,
            recipe_repo,
            ledger,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询单个原料
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 原料不存在
    pub fn get_ingredient(&self, ingredient_id: &str) -> ApiResult<Ingredient> {
        self.ingredient_repo
            .find_by_id(ingredient_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Ingredient(id={})不存在", ingredient_id)))
    }

    /// 按条件查询原料列表（按名称排序）
    pub fn list_ingredients(&self, filter: &IngredientFilter) -> ApiResult<Vec<Ingredient>> {
        let ingredients = self.ingredient_repo.list(filter)?;
        debug!(count = ingredients.len(), "原料列表查询完成");
        Ok(ingredients)
    }

    /// 引用该原料的配方
    pub fn recipes_using_ingredient(&self, ingredient_id: &str) -> ApiResult<Vec<Recipe>> {
        if ingredient_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("原料ID不能为空".to_string()));
        }
        Ok(self.recipe_repo.find_using_ingredient(ingredient_id)?)
    }

    // ==========================================
    // 写接口
    // ==========================================

    /// 新建原料
    ///
    /// # 错误
    /// - InvalidInput: 名称为空
    /// - Conflict: 名称重复
    /// - InvalidQuantity: 初始数量或阈值为负
    pub fn create_ingredient(&self, mut input: NewIngredient) -> ApiResult<Ingredient> {
        input.name = validate_name("原料名称", &input.name)?;
        Ok(self.ledger.create_ingredient(input)?)
    }

    /// 编辑原料；数量字段走 set 模式调整
    pub fn update_ingredient(
        &self,
        ingredient_id: &str,
        mut patch: IngredientPatch,
    ) -> ApiResult<Ingredient> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(validate_name("原料名称", &name)?);
        }
        Ok(self.ledger.update_ingredient(ingredient_id, patch)?)
    }

    /// 删除原料（引用它的配方保留失效引用）
    pub fn delete_ingredient(&self, ingredient_id: &str) -> ApiResult<Ingredient> {
        Ok(self.ledger.delete_ingredient(ingredient_id)?)
    }

    /// 调整库存
    ///
    /// # 参数
    /// - delta: increment/decrement 时为非负变化量；set 时为目标数量
    ///
    /// # 错误
    /// - NotFound: 原料不存在
    /// - InvalidQuantity: 结果为负或 delta 非法，库存保持不变
    pub fn adjust_ingredient(
        &self,
        ingredient_id: &str,
        delta: f64,
        mode: AdjustMode,
    ) -> ApiResult<StockAdjustment> {
        Ok(self.ledger.adjust_ingredient(ingredient_id, delta, mode)?)
    }
}
