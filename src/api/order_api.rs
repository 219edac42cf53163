// ==========================================
// 拼盘库存台账系统 - 生产单 API
// ==========================================
// 职责: 生产单创建、完成、取消、查询、备注维护、删除
// 红线: 状态迁移与库存扣减/回补全部委托 OrderLifecycleManager
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_notes;
use crate::config::config_manager::ConfigManager;
use crate::config::LedgerConfigReader;
use crate::domain::order::{OrderFilter, ProductionOrder};
use crate::engine::order_lifecycle::{CancelOutcome, OrderLifecycleManager};
use crate::repository::order_repo::OrderRepository;

// ==========================================
// OrderApi - 生产单 API
// ==========================================

/// 生产单API
///
/// 职责：
/// 1. 入参校验（备注长度、日期范围）
/// 2. 委托生命周期管理器执行状态迁移
/// 3. 生产单查询
pub struct OrderApi {
    order_repo: Arc<OrderRepository>,
    lifecycle: Arc<OrderLifecycleManager<ConfigManager>>,
    config: Arc<ConfigManager>,
}

impl OrderApi {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        lifecycle: Arc<OrderLifecycleManager<ConfigManager>>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            order_repo,
            lifecycle,
            config,
        }
    }

    // ==========================================
    // 生命周期
    // ==========================================

    /// 创建生产单并扣减原料
    ///
    /// # 错误
    /// - InvalidQuantity: 份数为 0 或超过上限
    /// - InvalidInput: 备注过长
    /// - NotFound: 配方或其引用的原料不存在
    /// - InsufficientStock: 携带全部不足的原料明细
    pub fn create_order(
        &self,
        recipe_id: &str,
        quantity: u32,
        notes: Option<String>,
    ) -> ApiResult<ProductionOrder> {
        if recipe_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("配方ID不能为空".to_string()));
        }
        validate_notes(notes.as_deref(), self.config.get_max_notes_length()?)?;
        Ok(self.lifecycle.create_order(recipe_id, quantity, notes)?)
    }

    /// 完成生产单
    pub fn complete_order(&self, order_id: &str) -> ApiResult<ProductionOrder> {
        Ok(self.lifecycle.complete_order(order_id)?)
    }

    /// 取消生产单并回补原料
    ///
    /// 回补失败的扣减行（原料已删除）在 unrestored 中返回
    pub fn cancel_order(&self, order_id: &str) -> ApiResult<CancelOutcome> {
        Ok(self.lifecycle.cancel_order(order_id)?)
    }

    /// 修改备注；空白备注视为清空
    pub fn update_order_notes(
        &self,
        order_id: &str,
        notes: Option<String>,
    ) -> ApiResult<ProductionOrder> {
        validate_notes(notes.as_deref(), self.config.get_max_notes_length()?)?;
        Ok(self.lifecycle.update_order_notes(order_id, notes)?)
    }

    /// 删除已完成/已取消的生产单
    pub fn delete_order(&self, order_id: &str) -> ApiResult<ProductionOrder> {
        Ok(self.lifecycle.delete_order(order_id)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按状态和创建日期范围查询（新的在前）
    pub fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<ProductionOrder>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "开始日期 {} 晚于结束日期 {}",
                    start, end
                )));
            }
        }
        Ok(self.order_repo.list(filter)?)
    }

    /// 查询单个生产单
    pub fn get_order(&self, order_id: &str) -> ApiResult<ProductionOrder> {
        self.order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", order_id)))
    }

    /// 按单号查询
    pub fn get_order_by_number(&self, order_number: &str) -> ApiResult<ProductionOrder> {
        self.order_repo
            .find_by_number(order_number)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(number={})不存在", order_number)))
    }
}
