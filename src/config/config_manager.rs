// ==========================================
// 拼盘库存台账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope，当前仅使用 global)
// ==========================================

use crate::config::ledger_config_trait::LedgerConfigReader;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, config_value = value, "配置已更新");
        Ok(())
    }

    /// 解析配置值，缺失或格式错误时回落到默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// LedgerConfigReader Trait 实现
// ==========================================
impl LedgerConfigReader for ConfigManager {
    fn get_default_low_stock_threshold(&self) -> Result<f64, Box<dyn Error>> {
        let value: f64 =
            self.get_parsed_or_default(config_keys::DEFAULT_LOW_STOCK_THRESHOLD, 4.0)?;
        // 负数阈值无意义
        Ok(if value.is_finite() && value >= 0.0 { value } else { 4.0 })
    }

    fn get_low_stock_alert_enabled(&self) -> Result<bool, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::LOW_STOCK_ALERT_ENABLED)?
            .unwrap_or_else(|| "true".to_string());
        Ok(!matches!(
            value.trim().to_lowercase().as_str(),
            "false" | "0" | "off" | "no"
        ))
    }

    fn get_adjust_max_retries(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::ADJUST_MAX_RETRIES, 8u32)?;
        Ok(value.max(1))
    }

    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::ORDER_NUMBER_PREFIX)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "ORD".to_string());
        Ok(value)
    }

    fn get_max_order_quantity(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::MAX_ORDER_QUANTITY, 100u32)?;
        Ok(value.max(1))
    }

    fn get_max_notes_length(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::MAX_NOTES_LENGTH, 500usize)
    }

    fn get_activity_default_page_size(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::ACTIVITY_DEFAULT_PAGE_SIZE, 50u32)?;
        Ok(value.max(1))
    }

    fn get_activity_max_page_size(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_parsed_or_default(config_keys::ACTIVITY_MAX_PAGE_SIZE, 200u32)?;
        Ok(value.max(1))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 原料
    pub const DEFAULT_LOW_STOCK_THRESHOLD: &str = "default_low_stock_threshold";
    pub const LOW_STOCK_ALERT_ENABLED: &str = "low_stock_alert_enabled";
    pub const ADJUST_MAX_RETRIES: &str = "adjust_max_retries";

    // 生产单
    pub const ORDER_NUMBER_PREFIX: &str = "order_number_prefix";
    pub const MAX_ORDER_QUANTITY: &str = "max_order_quantity";
    pub const MAX_NOTES_LENGTH: &str = "max_notes_length";

    // 活动日志分页
    pub const ACTIVITY_DEFAULT_PAGE_SIZE: &str = "activity_default_page_size";
    pub const ACTIVITY_MAX_PAGE_SIZE: &str = "activity_max_page_size";
}
