// ==========================================
// 拼盘库存台账系统 - 引擎层
// ==========================================
// 职责: 实现台账业务规则,不拼 SQL
// 红线: 库存数量只能经由 StockLedger 的调整原语变更
// ==========================================

pub mod error;
pub mod ledger;
pub mod order_lifecycle;
pub mod production_analyzer;
pub mod repositories;
pub mod shopping_list;

// 重导出核心引擎
pub use error::{InsufficientLine, LedgerError, LedgerResult};
pub use ledger::{IngredientLockRegistry, StockLedger};
pub use order_lifecycle::{CancelOutcome, OrderLifecycleManager};
pub use production_analyzer::ProductionAnalyzer;
pub use repositories::LedgerRepositories;
pub use shopping_list::ShoppingListGenerator;
