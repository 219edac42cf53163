// ==========================================
// 拼盘库存台账系统 - API 层
// ==========================================
// 职责: 面向调用方（传输层）的业务接口，负责入参校验与错误转换
// ==========================================

pub mod activity_api;
pub mod dashboard_api;
pub mod error;
pub mod ingredient_api;
pub mod order_api;
pub mod planning_api;
pub mod recipe_api;
pub mod validator;

// 重导出核心类型
pub use activity_api::ActivityApi;
pub use dashboard_api::{DashboardApi, DashboardSummary};
pub use error::{ApiError, ApiResult};
pub use ingredient_api::IngredientApi;
pub use order_api::OrderApi;
pub use planning_api::PlanningApi;
pub use recipe_api::RecipeApi;
