// ==========================================
// 拼盘库存台账系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合台账引擎所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ActivityLogRepository, IngredientRepository, OrderRepository, RecipeRepository,
};

/// 台账引擎仓储集合
///
/// 四个仓储共享同一个连接时，由 `from_connection` 一次性构造。
#[derive(Clone)]
pub struct LedgerRepositories {
    /// 原料仓储
    pub ingredient_repo: Arc<IngredientRepository>,
    /// 配方仓储
    pub recipe_repo: Arc<RecipeRepository>,
    /// 生产单仓储
    pub order_repo: Arc<OrderRepository>,
    /// 活动日志仓储
    pub activity_repo: Arc<ActivityLogRepository>,
}

impl LedgerRepositories {
    /// 创建新的仓储集合
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

    /// 基于共享连接构造全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            ingredient_repo: Arc::new(IngredientRepository::from_connection(conn.clone())),
            recipe_repo: Arc::new(RecipeRepository::from_connection(conn.clone())),
            order_repo: Arc::new(OrderRepository::from_connection(conn.clone())),
            activity_repo: Arc::new(ActivityLogRepository::new(conn)),
        }
    }
}
