// ==========================================
// 拼盘库存台账系统 - 应用层
// ==========================================
// 职责: 组装仓储/引擎/API，供传输层持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
