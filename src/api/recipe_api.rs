// ==========================================
// 拼盘库存台账系统 - 配方 API
// ==========================================
// 职责: 配方查询与维护
// 红线: 配方至少一行原料，单份用量为正；名称唯一
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_name, validate_recipe_lines};
use crate::domain::recipe::{NewRecipe, Recipe, RecipeFilter, RecipePatch};
use crate::repository::recipe_repo::RecipeRepository;

// ==========================================
// RecipeApi - 配方 API
// ==========================================
pub struct RecipeApi {
    recipe_repo: Arc<RecipeRepository>,
}

impl RecipeApi {
    pub fn new(recipe_repo: Arc<RecipeRepository>) -> Self {
        Self { recipe_repo }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按条件查询配方（按分类、展示顺序排序）
    pub fn list_recipes(&self, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>> {
        Ok(self.recipe_repo.list(filter)?)
    }

    /// 查询单个配方
    pub fn get_recipe(&self, recipe_id: &str) -> ApiResult<Recipe> {
        self.recipe_repo
            .find_by_id(recipe_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Recipe(id={})不存在", recipe_id)))
    }

    // ==========================================
    // 写接口
    // ==========================================

    /// 新建配方
    ///
    /// # 错误
    /// - InvalidInput: 名称为空或无原料行
    /// - InvalidQuantity: 原料行单份用量非正
    /// - Conflict: 名称重复
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub fn create_recipe(&self, input: NewRecipe) -> ApiResult<Recipe> {
        let name = validate_name("配方名称", &input.name)?;
        validate_recipe_lines(&input.ingredients)?;
        self.ensure_name_available(&name, None)?;

        let now = chrono::Local::now().naive_local();
        let recipe = Recipe {
            recipe_id: uuid::Uuid::new_v4().to_string(),
            name,
            category: input.category,
            display_order: input.display_order,
            ingredients: input.ingredients,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.recipe_repo.insert(&recipe)?;

        info!(recipe_id = %recipe.recipe_id, "配方已创建");
        Ok(recipe)
    }

    /// 编辑配方；原料行整体替换
    #[instrument(skip(self, patch))]
    pub fn update_recipe(&self, recipe_id: &str, patch: RecipePatch) -> ApiResult<Recipe> {
        let mut recipe = self.get_recipe(recipe_id)?;

        if let Some(name) = patch.name {
            let name = validate_name("配方名称", &name)?;
            if name != recipe.name {
                self.ensure_name_available(&name, Some(recipe_id))?;
            }
            recipe.name = name;
        }
        if let Some(lines) = patch.ingredients {
            validate_recipe_lines(&lines)?;
            recipe.ingredients = lines;
        }
        if let Some(category) = patch.category {
            recipe.category = category;
        }
        if let Some(display_order) = patch.display_order {
            recipe.display_order = display_order;
        }
        if let Some(is_active) = patch.is_active {
            recipe.is_active = is_active;
        }
        recipe.updated_at = chrono::Local::now().naive_local();

        self.recipe_repo.update(&recipe)?;
        info!("配方已更新");
        Ok(recipe)
    }

    /// 删除配方；已有生产单保留配方名称快照
    pub fn delete_recipe(&self, recipe_id: &str) -> ApiResult<()> {
        if !self.recipe_repo.delete(recipe_id)? {
            return Err(ApiError::NotFound(format!("Recipe(id={})不存在", recipe_id)));
        }
        info!(recipe_id, "配方已删除");
        Ok(())
    }

    fn ensure_name_available(&self, name: &str, own_id: Option<&str>) -> ApiResult<()> {
        match self.recipe_repo.find_by_name(name)? {
            Some(existing) if Some(existing.recipe_id.as_str()) != own_id => {
                Err(ApiError::Conflict(format!("配方名称已存在: {}", name)))
            }
            _ => Ok(()),
        }
    }
}
