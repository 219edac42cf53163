// ==========================================
// 拼盘库存台账系统 - 主入口
// ==========================================
// 职责: 初始化日志与应用状态，输出当前概览（JSON）
// 传输层（HTTP/IPC）不在本仓库内，调用方直接持有 AppState
// ==========================================

use board_ledger::app::{get_default_db_path, AppState};
use board_ledger::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", board_ledger::APP_NAME, board_ledger::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    let summary = state.dashboard_api.get_summary()?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
