// ==========================================
// 集成测试辅助工具
// ==========================================
// 职责: 构造 API 层 / 引擎层测试环境
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;
use tempfile::NamedTempFile;

use board_ledger::app::AppState;
use board_ledger::domain::{Ingredient, Recipe};
use board_ledger::engine::{LedgerRepositories, OrderLifecycleManager, StockLedger};

use super::mock_config::MockConfig;
use super::test_data_builder::{IngredientBuilder, RecipeBuilder};

pub use test_helpers::{create_test_db, open_shared_connection};

// ==========================================
// ApiTestEnv - 经由 AppState 组装的完整环境
// ==========================================
pub struct ApiTestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            _temp_file: temp_file,
            db_path,
            state,
        })
    }

    /// 新建原料（数量 + 阈值）
    pub fn add_ingredient(&self, name: &str, quantity: f64, threshold: f64) -> Ingredient {
        self.state
            .ingredient_api
            .create_ingredient(
                IngredientBuilder::new(name)
                    .quantity(quantity)
                    .threshold(threshold)
                    .build(),
            )
            .expect("新建原料失败")
    }

    /// 新建配方（原料, 单份用量）
    pub fn add_recipe(&self, name: &str, lines: &[(&Ingredient, f64)]) -> Recipe {
        let builder = lines
            .iter()
            .fold(RecipeBuilder::new(name), |b, (ing, qty)| b.line(ing, *qty));
        self.state
            .recipe_api
            .create_recipe(builder.build())
            .expect("新建配方失败")
    }

    /// 读取原料当前数量
    pub fn quantity_of(&self, ingredient_id: &str) -> f64 {
        self.state
            .ingredient_api
            .get_ingredient(ingredient_id)
            .expect("原料不存在")
            .current_quantity
    }
}

// ==========================================
// EngineTestEnv - 注入 MockConfig 的引擎环境
// ==========================================
pub struct EngineTestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub repos: LedgerRepositories,
    pub ledger: Arc<StockLedger<MockConfig>>,
    pub lifecycle: Arc<OrderLifecycleManager<MockConfig>>,
}

impl EngineTestEnv {
    pub fn new(config: MockConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let conn = open_shared_connection(&db_path)?;
        let repos = LedgerRepositories::from_connection(conn);
        let ledger = Arc::new(StockLedger::new(
            repos.ingredient_repo.clone(),
            repos.activity_repo.clone(),
            Arc::new(config),
        ));
        let lifecycle = Arc::new(OrderLifecycleManager::new(repos.clone(), ledger.clone()));
        Ok(Self {
            _temp_file: temp_file,
            db_path,
            repos,
            ledger,
            lifecycle,
        })
    }

    pub fn add_ingredient(&self, name: &str, quantity: f64, threshold: f64) -> Ingredient {
        self.ledger
            .create_ingredient(
                IngredientBuilder::new(name)
                    .quantity(quantity)
                    .threshold(threshold)
                    .build(),
            )
            .expect("新建原料失败")
    }

    /// 直接写入配方（绕过 API 校验）
    pub fn add_recipe(&self, name: &str, lines: &[(&Ingredient, f64)]) -> Recipe {
        let input = lines
            .iter()
            .fold(RecipeBuilder::new(name), |b, (ing, qty)| b.line(ing, *qty))
            .build();
        let now = chrono::Local::now().naive_local();
        let recipe = Recipe {
            recipe_id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            category: input.category,
            display_order: input.display_order,
            ingredients: input.ingredients,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.repos.recipe_repo.insert(&recipe).expect("写入配方失败");
        recipe
    }

    pub fn quantity_of(&self, ingredient_id: &str) -> f64 {
        self.repos
            .ingredient_repo
            .find_by_id(ingredient_id)
            .expect("查询失败")
            .expect("原料不存在")
            .current_quantity
    }
}
