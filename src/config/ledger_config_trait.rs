// ==========================================
// 拼盘库存台账系统 - 台账配置读取 Trait
// ==========================================
// 职责: 定义引擎层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// LedgerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）；测试中可注入 Mock
pub trait LedgerConfigReader: Send + Sync {
    // ===== 原料 =====

    /// 新建原料未指定阈值时使用的低库存阈值
    ///
    /// # 默认值
    /// - 4
    fn get_default_low_stock_threshold(&self) -> Result<f64, Box<dyn Error>>;

    /// 是否在跌破阈值时写入 low_stock_alert
    ///
    /// # 默认值
    /// - true
    fn get_low_stock_alert_enabled(&self) -> Result<bool, Box<dyn Error>>;

    /// 调整原语 CAS 冲突的最大重试次数
    ///
    /// # 默认值
    /// - 8
    fn get_adjust_max_retries(&self) -> Result<u32, Box<dyn Error>>;

    // ===== 生产单 =====

    /// 单号前缀
    ///
    /// # 默认值
    /// - ORD
    fn get_order_number_prefix(&self) -> Result<String, Box<dyn Error>>;

    /// 单个生产单允许的最大份数
    ///
    /// # 默认值
    /// - 100
    fn get_max_order_quantity(&self) -> Result<u32, Box<dyn Error>>;

    /// 备注最大字符数
    ///
    /// # 默认值
    /// - 500
    fn get_max_notes_length(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 活动日志 =====

    /// 默认分页大小
    ///
    /// # 默认值
    /// - 50
    fn get_activity_default_page_size(&self) -> Result<u32, Box<dyn Error>>;

    /// 分页大小上限
    ///
    /// # 默认值
    /// - 200
    fn get_activity_max_page_size(&self) -> Result<u32, Box<dyn Error>>;
}
