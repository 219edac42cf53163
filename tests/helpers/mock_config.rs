// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use board_ledger::config::LedgerConfigReader;
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub default_low_stock_threshold: f64,
    pub low_stock_alert_enabled: bool,
    pub adjust_max_retries: u32,
    pub order_number_prefix: String,
    pub max_order_quantity: u32,
    pub max_notes_length: usize,
    pub activity_default_page_size: u32,
    pub activity_max_page_size: u32,
}

impl MockConfig {
    /// 创建默认配置（与 ConfigManager 默认值一致）
    pub fn default() -> Self {
        Self {
            default_low_stock_threshold: 4.0,
            low_stock_alert_enabled: true,
            adjust_max_retries: 8,
            order_number_prefix: "ORD".to_string(),
            max_order_quantity: 100,
            max_notes_length: 500,
            activity_default_page_size: 50,
            activity_max_page_size: 200,
        }
    }

    /// 关闭低库存告警
    pub fn without_alerts() -> Self {
        let mut config = Self::default();
        config.low_stock_alert_enabled = false;
        config
    }

    /// 自定义单号前缀
    pub fn with_prefix(prefix: &str) -> Self {
        let mut config = Self::default();
        config.order_number_prefix = prefix.to_string();
        config
    }
}

impl LedgerConfigReader for MockConfig {
    fn get_default_low_stock_threshold(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.default_low_stock_threshold)
    }

    fn get_low_stock_alert_enabled(&self) -> Result<bool, Box<dyn Error>> {
        Ok(self.low_stock_alert_enabled)
    }

    fn get_adjust_max_retries(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.adjust_max_retries)
    }

    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.order_number_prefix.clone())
    }

    fn get_max_order_quantity(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.max_order_quantity)
    }

    fn get_max_notes_length(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.max_notes_length)
    }

    fn get_activity_default_page_size(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.activity_default_page_size)
    }

    fn get_activity_max_page_size(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.activity_max_page_size)
    }
}
