// ==========================================
// 拼盘库存台账系统 - 核心库
// ==========================================
// 职责: 原料台账、生产单生命周期、生产可行性分析、采购清单、活动日志
// 技术栈: Rust + SQLite
// 分层: domain → repository → engine → api → app
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AdjustMode, IngredientCategory, IngredientUnit, OrderStatus, RecipeCategory};

// 领域实体
pub use domain::{
    ActivityRecord, ActivityType, Ingredient, ProductionOrder, ProductionReport, Recipe,
    ShoppingList,
};

// 引擎
pub use engine::{
    LedgerError, OrderLifecycleManager, ProductionAnalyzer, ShoppingListGenerator, StockLedger,
};

// API
pub use api::{
    ActivityApi, ApiError, DashboardApi, IngredientApi, OrderApi, PlanningApi, RecipeApi,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "拼盘库存台账系统";
