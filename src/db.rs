// ==========================================
// 拼盘库存台账系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表语句集中于此，init_schema 幂等
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（微秒精度，字典序即时间序）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 建表 DDL
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS ingredient (
    ingredient_id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    is_custom INTEGER NOT NULL DEFAULT 0,
    current_quantity REAL NOT NULL CHECK (current_quantity >= 0),
    unit TEXT NOT NULL,
    low_stock_threshold REAL NOT NULL DEFAULT 4 CHECK (low_stock_threshold >= 0),
    aliases_json TEXT NOT NULL DEFAULT '[]',
    revision INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ingredient_category ON ingredient(category);

CREATE TABLE IF NOT EXISTS recipe (
    recipe_id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_recipe_category_order ON recipe(category, display_order);

-- ingredient_id 不设外键：删除原料后配方保留失效引用
CREATE TABLE IF NOT EXISTS recipe_ingredient (
    recipe_id TEXT NOT NULL REFERENCES recipe(recipe_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    ingredient_id TEXT NOT NULL,
    ingredient_name TEXT NOT NULL,
    quantity REAL NOT NULL CHECK (quantity > 0),
    unit TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (recipe_id, position)
);
CREATE INDEX IF NOT EXISTS idx_recipe_ingredient_ingredient ON recipe_ingredient(ingredient_id);

CREATE TABLE IF NOT EXISTS production_order (
    order_id TEXT PRIMARY KEY,
    order_number TEXT NOT NULL UNIQUE,
    order_year INTEGER NOT NULL,
    order_seq INTEGER NOT NULL,
    recipe_id TEXT NOT NULL,
    recipe_name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    status TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL,
    completed_at TEXT,
    cancelled_at TEXT,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_order_status_created ON production_order(status, created_at);
CREATE INDEX IF NOT EXISTS idx_order_year_seq ON production_order(order_year, order_seq);

CREATE TABLE IF NOT EXISTS order_debit (
    order_id TEXT NOT NULL REFERENCES production_order(order_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    ingredient_id TEXT NOT NULL,
    ingredient_name TEXT NOT NULL,
    quantity_debited REAL NOT NULL CHECK (quantity_debited >= 0),
    unit TEXT NOT NULL,
    PRIMARY KEY (order_id, position)
);

-- 每年已发放的最大序号（删除生产单后序号不回收）
CREATE TABLE IF NOT EXISTS order_sequence (
    order_year INTEGER PRIMARY KEY,
    last_seq INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_log (
    activity_id TEXT PRIMARY KEY,
    activity_type TEXT NOT NULL,
    ingredient_id TEXT,
    order_id TEXT,
    payload_json TEXT NOT NULL,
    metadata_json TEXT,
    activity_ts TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_type_ts ON activity_log(activity_type, activity_ts);
CREATE INDEX IF NOT EXISTS idx_activity_ts ON activity_log(activity_ts);
CREATE INDEX IF NOT EXISTS idx_activity_ingredient ON activity_log(ingredient_id, activity_ts);
CREATE INDEX IF NOT EXISTS idx_activity_order ON activity_log(order_id, activity_ts);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并写入 schema_version（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 时间戳 → 存储字符串
pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 存储字符串 → 时间戳（兼容不带小数秒的旧格式）
pub fn parse_ts(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
}

/// 在 row 映射闭包中解析时间戳列
pub(crate) fn ts_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    parse_ts(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_ts_round_trip_keeps_micros() {
        let ts = NaiveDateTime::parse_from_str("2025-03-01 08:15:30.123456", TS_FORMAT).unwrap();
        let raw = format_ts(&ts);
        assert_eq!(raw, "2025-03-01 08:15:30.123456");
        assert_eq!(parse_ts(&raw).unwrap(), ts);
        assert!(parse_ts("2025-03-01 08:15:30").is_ok());
    }
}
