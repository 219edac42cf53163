// ==========================================
// 拼盘库存台账系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 全部仓储共享同一个 SQLite 连接；StockLedger 全局唯一，保证原料锁注册表唯一
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    ActivityApi, DashboardApi, IngredientApi, OrderApi, PlanningApi, RecipeApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::engine::{LedgerRepositories, OrderLifecycleManager, StockLedger};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 原料API
    pub ingredient_api: Arc<IngredientApi>,

    /// 配方API
    pub recipe_api: Arc<RecipeApi>,

    /// 生产单API
    pub order_api: Arc<OrderApi>,

    /// 生产计划API（可行性分析 + 采购清单）
    pub planning_api: Arc<PlanningApi>,

    /// 活动日志API
    pub activity_api: Arc<ActivityApi>,

    /// 概览API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 初始化StockLedger与生命周期管理器
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) => tracing::info!(schema_version = v, "数据库结构已就绪"),
            Ok(None) => tracing::warn!("未读取到 schema_version"),
            Err(e) => tracing::warn!("读取 schema_version 失败: {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repos = LedgerRepositories::from_connection(conn.clone());

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let ledger = Arc::new(StockLedger::new(
            repos.ingredient_repo.clone(),
            repos.activity_repo.clone(),
            config_manager.clone(),
        ));
        let lifecycle = Arc::new(OrderLifecycleManager::new(repos.clone(), ledger.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let ingredient_api = Arc::new(IngredientApi::new(
            repos.ingredient_repo.clone(),
            repos.recipe_repo.clone(),
            ledger,
        ));
        let recipe_api = Arc::new(RecipeApi::new(repos.recipe_repo.clone()));
        let order_api = Arc::new(OrderApi::new(
            repos.order_repo.clone(),
            lifecycle,
            config_manager.clone(),
        ));
        let planning_api = Arc::new(PlanningApi::new(
            repos.ingredient_repo.clone(),
            repos.recipe_repo.clone(),
            repos.order_repo.clone(),
        ));
        let activity_api = Arc::new(ActivityApi::new(
            repos.activity_repo.clone(),
            config_manager.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            repos.ingredient_repo.clone(),
            repos.recipe_repo.clone(),
            repos.order_repo.clone(),
            repos.activity_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            ingredient_api,
            recipe_api,
            order_api,
            planning_api,
            activity_api,
            dashboard_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 BOARD_LEDGER_DB_PATH
/// 2. 用户数据目录下的 board-ledger/board_ledger.db
/// 3. 当前目录 ./board_ledger.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("BOARD_LEDGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./board_ledger.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("board-ledger");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("board_ledger.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_wires_every_api() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);

        let summary = state.dashboard_api.get_summary().unwrap();
        assert_eq!(summary.total_ingredients, 0);
        assert_eq!(summary.active_orders, 0);
        assert!(summary.recent_activity.is_empty());
    }
}
