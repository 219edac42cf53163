// ==========================================
// 拼盘库存台账系统 - 库存台账引擎
// ==========================================
// 职责: 原料库存的唯一变更入口（调整原语）+ 原料增删改
// 并发: 每个原料一把进程内锁（按原料ID注册），不同原料互不阻塞；
//       落库使用 revision CAS，跨进程写入冲突时在重试预算内重读重算
// 红线: 任何使数量变为负数的调整在落库前被拒绝，且不产生任何状态变化
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument, warn};

use crate::config::LedgerConfigReader;
use crate::domain::activity::{ActivityPayload, ActivityRecord};
use crate::domain::ingredient::{Ingredient, IngredientPatch, NewIngredient, StockAdjustment};
use crate::domain::types::AdjustMode;
use crate::engine::error::{LedgerError, LedgerResult};
use crate::repository::{ActivityLogRepository, IngredientRepository};

// ==========================================
// IngredientLockRegistry - 原料锁注册表
// ==========================================
/// 按原料ID分配互斥锁；同一ID始终返回同一把锁
#[derive(Default)]
pub struct IngredientLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IngredientLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定原料的锁句柄
    pub fn handle(&self, ingredient_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(ingredient_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 按ID升序获取一组锁句柄（去重），用于多原料操作避免死锁
    pub fn sorted_handles<'a, I>(&self, ingredient_ids: I) -> Vec<Arc<Mutex<()>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids: Vec<&str> = ingredient_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(|id| self.handle(id)).collect()
    }
}

/// 加锁（锁内无数据，中毒不影响正确性）
pub(crate) fn acquire(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}

// ==========================================
// StockLedger - 库存台账
// ==========================================
pub struct StockLedger<C>
where
    C: LedgerConfigReader,
{
    ingredient_repo: Arc<IngredientRepository>,
    activity_repo: Arc<ActivityLogRepository>,
    config: Arc<C>,
    locks: IngredientLockRegistry,
}

impl<C> StockLedger<C>
where
    C: LedgerConfigReader,
{
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        activity_repo: Arc<ActivityLogRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            ingredient_repo,
            activity_repo,
            config,
            locks: IngredientLockRegistry::new(),
        }
    }

    pub fn locks(&self) -> &IngredientLockRegistry {
        &self.locks
    }

    pub fn config(&self) -> &Arc<C> {
        &self.config
    }

    // ==========================================
    // 调整原语
    // ==========================================

    /// 原子调整（不写活动日志）
    ///
    /// 订单扣减/回补复用此原语，活动由调用方按自身事件类型记录
    pub fn apply_adjustment(
        &self,
        ingredient_id: &str,
        delta: f64,
        mode: AdjustMode,
    ) -> LedgerResult<StockAdjustment> {
        let handle = self.locks.handle(ingredient_id);
        let _guard = acquire(&handle);
        self.apply_adjustment_locked(ingredient_id, delta, mode)
    }

    /// 原子调整的锁内部分
    ///
    /// 调用方必须已持有该原料在本注册表中的锁
    pub(crate) fn apply_adjustment_locked(
        &self,
        ingredient_id: &str,
        delta: f64,
        mode: AdjustMode,
    ) -> LedgerResult<StockAdjustment> {
        if !delta.is_finite() {
            return Err(LedgerError::InvalidQuantity(format!(
                "调整量必须是有限数值: {}",
                delta
            )));
        }
        // 至少尝试一次
        let max_retries = self.config.get_adjust_max_retries()?.max(1);
        for attempt in 0..max_retries {
            let ingredient = self
                .ingredient_repo
                .find_by_id(ingredient_id)?
                .ok_or_else(|| LedgerError::not_found("Ingredient", ingredient_id))?;

            let new_quantity = mode.resolve(ingredient.current_quantity, delta);
            if new_quantity < 0.0 {
                return Err(LedgerError::InvalidQuantity(format!(
                    "原料 {} 调整后数量为负: {} {} {} = {}",
                    ingredient.name, ingredient.current_quantity, mode, delta, new_quantity
                )));
            }

            if self.ingredient_repo.compare_and_set_quantity(
                ingredient_id,
                ingredient.revision,
                new_quantity,
            )? {
                debug!(
                    ingredient_id = ingredient_id,
                    mode = %mode,
                    old_quantity = ingredient.current_quantity,
                    new_quantity = new_quantity,
                    "库存调整已落库"
                );
                return Ok(StockAdjustment {
                    ingredient_id: ingredient.ingredient_id,
                    ingredient_name: ingredient.name,
                    mode,
                    delta,
                    old_quantity: ingredient.current_quantity,
                    new_quantity,
                    low_stock_threshold: ingredient.low_stock_threshold,
                });
            }

            debug!(ingredient_id = ingredient_id, attempt = attempt, "revision 冲突，重读后重试");
        }

        Err(LedgerError::Conflict(format!(
            "原料 {} 并发写入冲突，重试 {} 次后仍未成功",
            ingredient_id, max_retries
        )))
    }

    /// 调整库存并记录活动（对外操作 adjustIngredient）
    ///
    /// 成功时写入一条 ingredient_adjustment；若本次跌破阈值再写入一条 low_stock_alert
    #[instrument(skip(self))]
    pub fn adjust_ingredient(
        &self,
        ingredient_id: &str,
        delta: f64,
        mode: AdjustMode,
    ) -> LedgerResult<StockAdjustment> {
        let adjustment = self.apply_adjustment(ingredient_id, delta, mode)?;

        self.append_activity(ActivityRecord::new(ActivityPayload::IngredientAdjustment {
            ingredient_id: adjustment.ingredient_id.clone(),
            ingredient_name: adjustment.ingredient_name.clone(),
            old_quantity: adjustment.old_quantity,
            new_quantity: adjustment.new_quantity,
            adjustment: delta,
            mode,
        }));
        self.raise_low_stock_alert(&adjustment);

        info!(
            ingredient = %adjustment.ingredient_name,
            old_quantity = adjustment.old_quantity,
            new_quantity = adjustment.new_quantity,
            "库存已调整"
        );
        Ok(adjustment)
    }

    /// 若调整跌破阈值且告警开启，写入 low_stock_alert
    ///
    /// # 返回
    /// - true: 已写入告警
    pub fn raise_low_stock_alert(&self, adjustment: &StockAdjustment) -> bool {
        if !adjustment.crossed_low_stock() {
            return false;
        }

        let enabled = match self.config.get_low_stock_alert_enabled() {
            Ok(v) => v,
            Err(e) => {
                warn!("读取低库存告警开关失败: {}，按开启处理", e);
                true
            }
        };
        if !enabled {
            return false;
        }

        warn!(
            ingredient = %adjustment.ingredient_name,
            current_quantity = adjustment.new_quantity,
            threshold = adjustment.low_stock_threshold,
            "原料跌破低库存阈值"
        );
        self.append_activity(ActivityRecord::new(ActivityPayload::LowStockAlert {
            ingredient_id: adjustment.ingredient_id.clone(),
            ingredient_name: adjustment.ingredient_name.clone(),
            current_quantity: adjustment.new_quantity,
            threshold: adjustment.low_stock_threshold,
        }));
        true
    }

    /// 追加活动记录；写入失败只告警，不回滚已完成的库存变更
    pub fn append_activity(&self, record: ActivityRecord) {
        if let Err(e) = self.activity_repo.insert(&record) {
            warn!(
                activity_type = record.activity_type().as_str(),
                error = %e,
                "活动日志写入失败"
            );
        }
    }

    // ==========================================
    // 原料增删改
    // ==========================================

    /// 新建原料
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub fn create_ingredient(&self, input: NewIngredient) -> LedgerResult<Ingredient> {
        let name = input.name.trim().to_string();
        if self.ingredient_repo.find_by_name(&name)?.is_some() {
            return Err(LedgerError::Conflict(format!("原料名称已存在: {}", name)));
        }
        if !input.current_quantity.is_finite() || input.current_quantity < 0.0 {
            return Err(LedgerError::InvalidQuantity(format!(
                "初始数量不能为负: {}",
                input.current_quantity
            )));
        }

        let threshold = match input.low_stock_threshold {
            Some(v) => v,
            None => self.config.get_default_low_stock_threshold()?,
        };
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(LedgerError::InvalidQuantity(format!(
                "低库存阈值不能为负: {}",
                threshold
            )));
        }

        let now = chrono::Local::now().naive_local();
        let ingredient = Ingredient {
            ingredient_id: uuid::Uuid::new_v4().to_string(),
            name,
            category: input.category,
            is_custom: input.is_custom,
            current_quantity: input.current_quantity,
            unit: input.unit,
            low_stock_threshold: threshold,
            aliases: input.aliases,
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        self.ingredient_repo.insert(&ingredient)?;

        self.append_activity(ActivityRecord::new(ActivityPayload::IngredientCreated {
            ingredient_id: ingredient.ingredient_id.clone(),
            ingredient_name: ingredient.name.clone(),
            initial_quantity: ingredient.current_quantity,
        }));
        info!(ingredient_id = %ingredient.ingredient_id, "原料已创建");
        Ok(ingredient)
    }

    /// 编辑原料
    ///
    /// 元数据直接更新；current_quantity 走 set 模式的调整原语
    #[instrument(skip(self, patch))]
    pub fn update_ingredient(
        &self,
        ingredient_id: &str,
        patch: IngredientPatch,
    ) -> LedgerResult<Ingredient> {
        let mut ingredient = self
            .ingredient_repo
            .find_by_id(ingredient_id)?
            .ok_or_else(|| LedgerError::not_found("Ingredient", ingredient_id))?;

        if patch.has_metadata_changes() {
            if let Some(name) = patch.name.as_deref().map(str::trim) {
                if name != ingredient.name {
                    if let Some(other) = self.ingredient_repo.find_by_name(name)? {
                        if other.ingredient_id != ingredient.ingredient_id {
                            return Err(LedgerError::Conflict(format!(
                                "原料名称已存在: {}",
                                name
                            )));
                        }
                    }
                }
                ingredient.name = name.to_string();
            }
            if let Some(threshold) = patch.low_stock_threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(LedgerError::InvalidQuantity(format!(
                        "低库存阈值不能为负: {}",
                        threshold
                    )));
                }
                ingredient.low_stock_threshold = threshold;
            }
            if let Some(category) = patch.category {
                ingredient.category = category;
            }
            if let Some(is_custom) = patch.is_custom {
                ingredient.is_custom = is_custom;
            }
            if let Some(unit) = patch.unit {
                ingredient.unit = unit;
            }
            if let Some(aliases) = patch.aliases {
                ingredient.aliases = aliases;
            }
            ingredient.updated_at = chrono::Local::now().naive_local();
            self.ingredient_repo.update_metadata(&ingredient)?;
            info!("原料元数据已更新");
        }

        if let Some(quantity) = patch.current_quantity {
            self.adjust_ingredient(ingredient_id, quantity, AdjustMode::Set)?;
        }

        self.ingredient_repo
            .find_by_id(ingredient_id)?
            .ok_or_else(|| LedgerError::not_found("Ingredient", ingredient_id))
    }

    /// 删除原料（配方中的引用保留）
    #[instrument(skip(self))]
    pub fn delete_ingredient(&self, ingredient_id: &str) -> LedgerResult<Ingredient> {
        let handle = self.locks.handle(ingredient_id);
        let _guard = acquire(&handle);

        let removed = self
            .ingredient_repo
            .delete(ingredient_id)?
            .ok_or_else(|| LedgerError::not_found("Ingredient", ingredient_id))?;

        self.append_activity(ActivityRecord::new(ActivityPayload::IngredientDeleted {
            ingredient_id: removed.ingredient_id.clone(),
            ingredient_name: removed.name.clone(),
        }));
        info!(name = %removed.name, "原料已删除");
        Ok(removed)
    }
}
