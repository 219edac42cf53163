// ==========================================
// 拼盘库存台账系统 - 生产单生命周期引擎
// ==========================================
// 状态机: IN_PROGRESS --complete--> COMPLETED
//         IN_PROGRESS --cancel-->   CANCELLED
// 创建: 按原料ID升序加锁 → 校验库存 → 逐项扣减（失败则补偿已扣项）→ 落库
// 取消: 先条件迁移状态（仅一次成功），再逐项回补；缺失原料记录并继续
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::LedgerConfigReader;
use crate::domain::activity::{ActivityPayload, ActivityRecord};
use crate::domain::ingredient::StockAdjustment;
use crate::domain::order::{DebitedIngredient, OrderNumber, ProductionOrder};
use crate::domain::recipe::Recipe;
use crate::domain::types::{AdjustMode, OrderStatus};
use crate::engine::error::{InsufficientLine, LedgerError, LedgerResult};
use crate::engine::ledger::{acquire, StockLedger};
use crate::engine::repositories::LedgerRepositories;

/// 取消结果：未能回补的扣减行（原料已被删除等）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOutcome {
    pub order: ProductionOrder,
    pub unrestored: Vec<DebitedIngredient>,
}

// ==========================================
// OrderLifecycleManager - 生产单生命周期
// ==========================================
pub struct OrderLifecycleManager<C>
where
    C: LedgerConfigReader,
{
    repos: LedgerRepositories,
    ledger: Arc<StockLedger<C>>,
    // 单号分配 + 落库串行化，避免同年序号并发重复
    numbering: Mutex<()>,
}

impl<C> OrderLifecycleManager<C>
where
    C: LedgerConfigReader,
{
    pub fn new(repos: LedgerRepositories, ledger: Arc<StockLedger<C>>) -> Self {
        Self {
            repos,
            ledger,
            numbering: Mutex::new(()),
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建生产单并扣减原料
    ///
    /// # 错误
    /// - InvalidQuantity: 份数为 0 或超过上限
    /// - NotFound: 配方不存在，或配方引用的原料已被删除
    /// - InsufficientStock: 列出全部不足的原料，不扣减任何原料
    #[instrument(skip(self, notes))]
    pub fn create_order(
        &self,
        recipe_id: &str,
        quantity: u32,
        notes: Option<String>,
    ) -> LedgerResult<ProductionOrder> {
        let max_quantity = self.ledger.config().get_max_order_quantity()?;
        if quantity == 0 || quantity > max_quantity {
            return Err(LedgerError::InvalidQuantity(format!(
                "生产份数必须在 1..={} 之间: {}",
                max_quantity, quantity
            )));
        }

        let recipe = self
            .repos
            .recipe_repo
            .find_by_id(recipe_id)?
            .ok_or_else(|| LedgerError::not_found("Recipe", recipe_id))?;

        let required = required_by_ingredient(&recipe, quantity);
        let handles = self
            .ledger
            .locks()
            .sorted_handles(required.keys().map(String::as_str));
        let guards: Vec<_> = handles.iter().map(|h| acquire(h)).collect();

        // ===== 锁内校验 =====
        let mut insufficient: Vec<InsufficientLine> = Vec::new();
        for (ingredient_id, needed) in &required {
            let ingredient = self
                .repos
                .ingredient_repo
                .find_by_id(ingredient_id)?
                .ok_or_else(|| LedgerError::not_found("Ingredient", ingredient_id))?;
            if ingredient.current_quantity < *needed {
                insufficient.push(InsufficientLine {
                    ingredient_id: ingredient.ingredient_id,
                    ingredient_name: ingredient.name,
                    required: *needed,
                    available: ingredient.current_quantity,
                    unit: ingredient.unit,
                });
            }
        }
        if !insufficient.is_empty() {
            info!(
                recipe = %recipe.name,
                insufficient = insufficient.len(),
                "库存不足，生产单未创建"
            );
            return Err(LedgerError::InsufficientStock(insufficient));
        }

        // ===== 锁内扣减 =====
        let mut applied: Vec<StockAdjustment> = Vec::new();
        let mut debits: Vec<DebitedIngredient> = Vec::new();
        for line in &recipe.ingredients {
            let amount = line.quantity * f64::from(quantity);
            match self
                .ledger
                .apply_adjustment_locked(&line.ingredient_id, amount, AdjustMode::Decrement)
            {
                Ok(adjustment) => {
                    debits.push(DebitedIngredient {
                        ingredient_id: line.ingredient_id.clone(),
                        ingredient_name: adjustment.ingredient_name.clone(),
                        quantity_debited: amount,
                        unit: line.unit,
                    });
                    applied.push(adjustment);
                }
                Err(e) => {
                    warn!(ingredient_id = %line.ingredient_id, error = %e, "扣减失败，回补已扣原料");
                    self.compensate(&applied);
                    return Err(e);
                }
            }
        }

        // ===== 单号 + 落库 =====
        let order = match self.persist_order(&recipe, quantity, notes, debits) {
            Ok(order) => order,
            Err(e) => {
                error!(error = %e, "生产单落库失败，回补已扣原料");
                self.compensate(&applied);
                return Err(e);
            }
        };
        drop(guards);

        // ===== 活动 =====
        self.ledger.append_activity(
            ActivityRecord::new(ActivityPayload::OrderCreated {
                order_id: order.order_id.clone(),
                order_number: order.order_number.clone(),
                recipe_name: order.recipe_name.clone(),
                order_quantity: order.quantity,
            })
            .with_metadata(&order.debited_ingredients),
        );
        for adjustment in &applied {
            self.ledger.raise_low_stock_alert(adjustment);
        }

        info!(
            order_number = %order.order_number,
            recipe = %order.recipe_name,
            quantity = order.quantity,
            "生产单已创建"
        );
        Ok(order)
    }

    fn persist_order(
        &self,
        recipe: &Recipe,
        quantity: u32,
        notes: Option<String>,
        debits: Vec<DebitedIngredient>,
    ) -> LedgerResult<ProductionOrder> {
        let _numbering = acquire(&self.numbering);

        let prefix = self.ledger.config().get_order_number_prefix()?;
        let now = chrono::Local::now().naive_local();
        let year = now.year();
        let last = self.repos.order_repo.last_sequence(year)?;
        let number = OrderNumber::next_after(&prefix, year, last);

        let order = ProductionOrder {
            order_id: uuid::Uuid::new_v4().to_string(),
            order_number: number.to_string(),
            recipe_id: recipe.recipe_id.clone(),
            recipe_name: recipe.name.clone(),
            quantity,
            status: OrderStatus::InProgress,
            debited_ingredients: debits,
            notes: notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            completed_at: None,
            cancelled_at: None,
        };
        self.repos.order_repo.insert(&order, &number)?;
        Ok(order)
    }

    /// 回补已完成的扣减（调用方持有相关原料锁）
    fn compensate(&self, applied: &[StockAdjustment]) {
        for adjustment in applied.iter().rev() {
            if let Err(e) = self.ledger.apply_adjustment_locked(
                &adjustment.ingredient_id,
                adjustment.delta,
                AdjustMode::Increment,
            ) {
                error!(
                    ingredient_id = %adjustment.ingredient_id,
                    amount = adjustment.delta,
                    error = %e,
                    "补偿回补失败"
                );
            }
        }
    }

    // ==========================================
    // 状态迁移
    // ==========================================

    /// 完成生产单（不回补原料）
    #[instrument(skip(self))]
    pub fn complete_order(&self, order_id: &str) -> LedgerResult<ProductionOrder> {
        let order = self.claim_transition(order_id, OrderStatus::Completed, "complete")?;

        self.ledger.append_activity(ActivityRecord::new(ActivityPayload::OrderCompleted {
            order_id: order.order_id.clone(),
            order_number: order.order_number.clone(),
            recipe_name: order.recipe_name.clone(),
            order_quantity: order.quantity,
        }));
        info!(order_number = %order.order_number, "生产单已完成");
        Ok(order)
    }

    /// 取消生产单并回补全部扣减
    #[instrument(skip(self))]
    pub fn cancel_order(&self, order_id: &str) -> LedgerResult<CancelOutcome> {
        let order = self.claim_transition(order_id, OrderStatus::Cancelled, "cancel")?;

        let mut unrestored: Vec<DebitedIngredient> = Vec::new();
        for debit in &order.debited_ingredients {
            if let Err(e) = self.ledger.apply_adjustment(
                &debit.ingredient_id,
                debit.quantity_debited,
                AdjustMode::Increment,
            ) {
                warn!(
                    order_number = %order.order_number,
                    ingredient_id = %debit.ingredient_id,
                    ingredient = %debit.ingredient_name,
                    error = %e,
                    "回补失败，已记录并继续"
                );
                unrestored.push(debit.clone());
            }
        }

        self.ledger.append_activity(
            ActivityRecord::new(ActivityPayload::OrderCancelled {
                order_id: order.order_id.clone(),
                order_number: order.order_number.clone(),
                recipe_name: order.recipe_name.clone(),
                order_quantity: order.quantity,
            })
            .with_metadata(&serde_json::json!({
                "restored": order.debited_ingredients.len() - unrestored.len(),
                "unrestored": unrestored,
            })),
        );
        info!(
            order_number = %order.order_number,
            unrestored = unrestored.len(),
            "生产单已取消"
        );
        Ok(CancelOutcome { order, unrestored })
    }

    /// 条件迁移 IN_PROGRESS → target，返回迁移后的生产单
    fn claim_transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        action: &str,
    ) -> LedgerResult<ProductionOrder> {
        let order = self
            .repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| LedgerError::not_found("Order", order_id))?;
        if !order.status.can_transition_to(target) {
            return Err(LedgerError::InvalidState {
                from: order.status.to_string(),
                action: action.to_string(),
            });
        }

        let now = chrono::Local::now().naive_local();
        let claimed = self.repos.order_repo.transition_status(
            order_id,
            OrderStatus::InProgress,
            target,
            now,
        )?;
        if !claimed {
            // 并发的另一次迁移抢先完成
            let current = self
                .repos
                .order_repo
                .find_by_id(order_id)?
                .map(|o| o.status.to_string())
                .unwrap_or_else(|| "DELETED".to_string());
            return Err(LedgerError::InvalidState {
                from: current,
                action: action.to_string(),
            });
        }

        self.repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| LedgerError::not_found("Order", order_id))
    }

    // ==========================================
    // 其他维护操作
    // ==========================================

    /// 修改备注
    pub fn update_order_notes(
        &self,
        order_id: &str,
        notes: Option<String>,
    ) -> LedgerResult<ProductionOrder> {
        let notes = notes.filter(|n| !n.trim().is_empty());
        if !self
            .repos
            .order_repo
            .update_notes(order_id, notes.as_deref())?
        {
            return Err(LedgerError::not_found("Order", order_id));
        }
        self.repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| LedgerError::not_found("Order", order_id))
    }

    /// 删除终态生产单；进行中的生产单需先取消
    #[instrument(skip(self))]
    pub fn delete_order(&self, order_id: &str) -> LedgerResult<ProductionOrder> {
        let order = self
            .repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| LedgerError::not_found("Order", order_id))?;
        if !order.status.is_terminal() {
            return Err(LedgerError::InvalidState {
                from: order.status.to_string(),
                action: "delete".to_string(),
            });
        }

        if !self.repos.order_repo.delete(order_id)? {
            return Err(LedgerError::not_found("Order", order_id));
        }
        info!(order_number = %order.order_number, "生产单已删除");
        Ok(order)
    }
}

/// 按原料ID汇总一个生产单的需求量（同一原料多行时累加）
fn required_by_ingredient(recipe: &Recipe, quantity: u32) -> BTreeMap<String, f64> {
    let mut required: BTreeMap<String, f64> = BTreeMap::new();
    for line in &recipe.ingredients {
        *required.entry(line.ingredient_id.clone()).or_insert(0.0) +=
            line.quantity * f64::from(quantity);
    }
    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::RecipeIngredient;
    use crate::domain::types::{IngredientUnit, RecipeCategory};

    #[test]
    fn test_required_sums_duplicate_lines() {
        let now = chrono::Local::now().naive_local();
        let line = |id: &str, q: f64| RecipeIngredient {
            ingredient_id: id.to_string(),
            ingredient_name: id.to_string(),
            quantity: q,
            unit: IngredientUnit::Oz,
            notes: None,
        };
        let recipe = Recipe {
            recipe_id: "R1".to_string(),
            name: "Board".to_string(),
            category: RecipeCategory::Classic,
            display_order: 0,
            ingredients: vec![line("B", 1.0), line("A", 2.0), line("B", 0.5)],
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let required = required_by_ingredient(&recipe, 3);
        let keys: Vec<_> = required.keys().cloned().collect();
        assert_eq!(keys, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(required["A"], 6.0);
        assert_eq!(required["B"], 4.5);
    }
}
