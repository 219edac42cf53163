// ==========================================
// 生产单生命周期集成测试
// ==========================================
// 测试范围:
// 1. 创建扣减 / 取消回补对称
// 2. 终态不可重复迁移
// 3. 单号按年连续，删除后不复用
// 4. 库存不足时列出全部不足原料且不扣减
// 5. 活动日志完整性
// ==========================================

mod helpers;

use chrono::Datelike;

use board_ledger::domain::{
    ActivityFilter, ActivityPayload, ActivityType, IngredientPatch, OrderFilter, Pagination,
};
use board_ledger::engine::LedgerError;
use board_ledger::OrderStatus;
use helpers::api_test_helper::EngineTestEnv;
use helpers::mock_config::MockConfig;

fn activity_count(env: &EngineTestEnv, filter: ActivityFilter) -> u64 {
    env.repos
        .activity_repo
        .query(&filter, Pagination::new(1, 200))
        .unwrap()
        .1
}

fn of_type(activity_type: ActivityType) -> ActivityFilter {
    ActivityFilter {
        activity_type: Some(activity_type),
        ..Default::default()
    }
}

// ==========================================
// 扣减 / 回补
// ==========================================

#[test]
fn test_create_debits_and_cancel_restores_exactly() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 20.0, 2.0);
    let crackers = env.add_ingredient("Crackers", 50.0, 10.0);
    let recipe = env.add_recipe("Classic", &[(&brie, 2.5), (&crackers, 8.0)]);

    let order = env.lifecycle.create_order(&recipe.recipe_id, 3, None).unwrap();
    assert_eq!(order.status, OrderStatus::InProgress);
    assert_eq!(order.recipe_name, "Classic");
    assert_eq!(order.debited_ingredients.len(), 2);
    assert_eq!(order.debited_ingredients[0].quantity_debited, 7.5);
    assert_eq!(order.debited_ingredients[1].quantity_debited, 24.0);
    assert_eq!(env.quantity_of(&brie.ingredient_id), 12.5);
    assert_eq!(env.quantity_of(&crackers.ingredient_id), 26.0);

    let outcome = env.lifecycle.cancel_order(&order.order_id).unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert!(outcome.order.cancelled_at.is_some());
    assert!(outcome.unrestored.is_empty());
    assert_eq!(env.quantity_of(&brie.ingredient_id), 20.0);
    assert_eq!(env.quantity_of(&crackers.ingredient_id), 50.0);
}

#[test]
fn test_debit_lines_snapshot_current_ingredient_name() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Brie Board", &[(&brie, 2.0)]);

    env.ledger
        .update_ingredient(
            &brie.ingredient_id,
            IngredientPatch {
                name: Some("Triple Cream Brie".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let order = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    assert_eq!(order.debited_ingredients[0].ingredient_name, "Triple Cream Brie");

    let stored = env.repos.order_repo.find_by_id(&order.order_id).unwrap().unwrap();
    assert_eq!(stored.debited_ingredients[0].ingredient_name, "Triple Cream Brie");
}

#[test]
fn test_complete_keeps_debit() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 2.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 4.0)]);

    let order = env.lifecycle.create_order(&recipe.recipe_id, 2, None).unwrap();
    let done = env.lifecycle.complete_order(&order.order_id).unwrap();

    assert_eq!(done.status, OrderStatus::Completed);
    assert!(done.completed_at.is_some());
    assert!(done.cancelled_at.is_none());
    assert_eq!(env.quantity_of(&brie.ingredient_id), 2.0);
}

#[test]
fn test_terminal_states_reject_second_transition() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);

    let first = env.lifecycle.create_order(&recipe.recipe_id, 4, None).unwrap();
    env.lifecycle.cancel_order(&first.order_id).unwrap();
    let again = env.lifecycle.cancel_order(&first.order_id).unwrap_err();
    assert!(matches!(again, LedgerError::InvalidState { .. }));
    let complete = env.lifecycle.complete_order(&first.order_id).unwrap_err();
    assert!(matches!(complete, LedgerError::InvalidState { .. }));
    // 不重复回补
    assert_eq!(env.quantity_of(&brie.ingredient_id), 10.0);

    let second = env.lifecycle.create_order(&recipe.recipe_id, 4, None).unwrap();
    env.lifecycle.complete_order(&second.order_id).unwrap();
    match env.lifecycle.complete_order(&second.order_id).unwrap_err() {
        LedgerError::InvalidState { from, action } => {
            assert_eq!(from, OrderStatus::Completed.to_string());
            assert_eq!(action, "complete");
        }
        other => panic!("Expected InvalidState, got {:?}", other),
    }
    assert!(matches!(
        env.lifecycle.cancel_order(&second.order_id).unwrap_err(),
        LedgerError::InvalidState { .. }
    ));
    assert_eq!(env.quantity_of(&brie.ingredient_id), 6.0);

    assert_eq!(activity_count(&env, of_type(ActivityType::OrderCancelled)), 1);
    assert_eq!(activity_count(&env, of_type(ActivityType::OrderCompleted)), 1);
}

#[test]
fn test_unknown_order_is_not_found() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    assert!(env.lifecycle.complete_order("nope").unwrap_err().is_not_found());
    assert!(env.lifecycle.cancel_order("nope").unwrap_err().is_not_found());
}

// ==========================================
// 创建校验
// ==========================================

#[test]
fn test_insufficient_stock_lists_every_line_and_debits_nothing() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 3.0, 0.0);
    let grapes = env.add_ingredient("Grapes", 100.0, 0.0);
    let salami = env.add_ingredient("Salami", 1.0, 0.0);
    let recipe = env.add_recipe("Big", &[(&brie, 2.0), (&grapes, 1.0), (&salami, 1.0)]);

    let err = env.lifecycle.create_order(&recipe.recipe_id, 2, None).unwrap_err();
    match err {
        LedgerError::InsufficientStock(lines) => {
            assert_eq!(lines.len(), 2);
            let brie_line = lines
                .iter()
                .find(|l| l.ingredient_id == brie.ingredient_id)
                .unwrap();
            assert_eq!(brie_line.required, 4.0);
            assert_eq!(brie_line.available, 3.0);
            assert!(lines.iter().any(|l| l.ingredient_id == salami.ingredient_id));
        }
        other => panic!("Expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(env.quantity_of(&brie.ingredient_id), 3.0);
    assert_eq!(env.quantity_of(&grapes.ingredient_id), 100.0);
    assert_eq!(env.quantity_of(&salami.ingredient_id), 1.0);
    assert!(env.repos.order_repo.list(&OrderFilter::default()).unwrap().is_empty());
    assert_eq!(activity_count(&env, of_type(ActivityType::OrderCreated)), 0);
}

#[test]
fn test_quantity_bounds_and_missing_references() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 1000.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);

    assert!(matches!(
        env.lifecycle.create_order(&recipe.recipe_id, 0, None).unwrap_err(),
        LedgerError::InvalidQuantity(_)
    ));
    assert!(matches!(
        env.lifecycle.create_order(&recipe.recipe_id, 101, None).unwrap_err(),
        LedgerError::InvalidQuantity(_)
    ));
    assert!(env
        .lifecycle
        .create_order("no-such-recipe", 1, None)
        .unwrap_err()
        .is_not_found());

    env.ledger.delete_ingredient(&brie.ingredient_id).unwrap();
    assert!(env
        .lifecycle
        .create_order(&recipe.recipe_id, 1, None)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_repeated_ingredient_lines_are_checked_in_total() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 5.0, 0.0);
    let recipe = env.add_recipe("Double Brie", &[(&brie, 2.0), (&brie, 2.0)]);

    // 单行 4 <= 5，但合计 8 > 5
    let err = env.lifecycle.create_order(&recipe.recipe_id, 2, None).unwrap_err();
    match err {
        LedgerError::InsufficientStock(lines) => {
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].required, 8.0);
        }
        other => panic!("Expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(env.quantity_of(&brie.ingredient_id), 5.0);
}

// ==========================================
// 单号
// ==========================================

#[test]
fn test_order_numbers_are_sequential_and_never_reused() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 100.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);
    let year = chrono::Local::now().year();

    let first = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    assert_eq!(first.order_number, format!("ORD-{}-001", year));

    let second = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    assert_eq!(second.order_number, format!("ORD-{}-002", year));

    // 删除最新的单据后，序号仍继续增长
    env.lifecycle.cancel_order(&second.order_id).unwrap();
    env.lifecycle.delete_order(&second.order_id).unwrap();

    let third = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    assert_eq!(third.order_number, format!("ORD-{}-003", year));
}

#[test]
fn test_order_number_prefix_from_config() {
    let env = EngineTestEnv::new(MockConfig::with_prefix("BRD")).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);
    let year = chrono::Local::now().year();

    let order = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    assert_eq!(order.order_number, format!("BRD-{}-001", year));
}

// ==========================================
// 取消时原料已删除
// ==========================================

#[test]
fn test_cancel_reports_lines_that_could_not_be_restored() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let figs = env.add_ingredient("Figs", 10.0, 0.0);
    let recipe = env.add_recipe("Fig Board", &[(&brie, 1.0), (&figs, 2.0)]);

    let order = env.lifecycle.create_order(&recipe.recipe_id, 2, None).unwrap();
    env.ledger.delete_ingredient(&figs.ingredient_id).unwrap();

    let outcome = env.lifecycle.cancel_order(&order.order_id).unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert_eq!(outcome.unrestored.len(), 1);
    assert_eq!(outcome.unrestored[0].ingredient_id, figs.ingredient_id);
    assert_eq!(env.quantity_of(&brie.ingredient_id), 10.0);
}

// ==========================================
// 维护操作
// ==========================================

#[test]
fn test_delete_requires_terminal_state() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);
    let order = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();

    match env.lifecycle.delete_order(&order.order_id).unwrap_err() {
        LedgerError::InvalidState { action, .. } => assert_eq!(action, "delete"),
        other => panic!("Expected InvalidState, got {:?}", other),
    }

    env.lifecycle.complete_order(&order.order_id).unwrap();
    let deleted = env.lifecycle.delete_order(&order.order_id).unwrap();
    assert_eq!(deleted.order_id, order.order_id);
    assert!(env
        .repos
        .order_repo
        .find_by_id(&order.order_id)
        .unwrap()
        .is_none());
}

#[test]
fn test_update_notes_blank_clears() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);
    let order = env
        .lifecycle
        .create_order(&recipe.recipe_id, 1, Some("for Friday".to_string()))
        .unwrap();
    assert_eq!(order.notes.as_deref(), Some("for Friday"));

    let updated = env
        .lifecycle
        .update_order_notes(&order.order_id, Some("for Saturday".to_string()))
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("for Saturday"));

    let cleared = env
        .lifecycle
        .update_order_notes(&order.order_id, Some("   ".to_string()))
        .unwrap();
    assert!(cleared.notes.is_none());

    assert!(env
        .lifecycle
        .update_order_notes("nope", None)
        .unwrap_err()
        .is_not_found());
}

// ==========================================
// 活动完整性
// ==========================================

#[test]
fn test_each_order_event_logs_exactly_once() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 5.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 3.0)]);

    // 10 → 4 跌破阈值 5
    let order = env.lifecycle.create_order(&recipe.recipe_id, 2, None).unwrap();
    env.lifecycle.cancel_order(&order.order_id).unwrap();

    let by_order = ActivityFilter {
        order_id: Some(order.order_id.clone()),
        ..Default::default()
    };
    assert_eq!(activity_count(&env, by_order), 2);
    assert_eq!(activity_count(&env, of_type(ActivityType::OrderCreated)), 1);
    assert_eq!(activity_count(&env, of_type(ActivityType::OrderCancelled)), 1);
    assert_eq!(activity_count(&env, of_type(ActivityType::LowStockAlert)), 1);
    // 扣减与回补不记作手工调整
    assert_eq!(
        activity_count(&env, of_type(ActivityType::IngredientAdjustment)),
        0
    );

    let (records, _) = env
        .repos
        .activity_repo
        .query(&of_type(ActivityType::OrderCreated), Pagination::new(1, 1))
        .unwrap();
    match &records[0].payload {
        ActivityPayload::OrderCreated {
            order_number,
            order_quantity,
            ..
        } => {
            assert_eq!(order_number, &order.order_number);
            assert_eq!(*order_quantity, 2);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
    assert!(records[0].metadata.is_some());
}

#[test]
fn test_list_orders_filters_by_status() {
    let env = EngineTestEnv::new(MockConfig::default()).unwrap();
    let brie = env.add_ingredient("Brie", 10.0, 0.0);
    let recipe = env.add_recipe("Solo", &[(&brie, 1.0)]);

    let a = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    let b = env.lifecycle.create_order(&recipe.recipe_id, 1, None).unwrap();
    env.lifecycle.complete_order(&a.order_id).unwrap();

    let all = env.repos.order_repo.list(&OrderFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    // 新的在前
    assert_eq!(all[0].order_id, b.order_id);

    let in_progress = env
        .repos
        .order_repo
        .list(&OrderFilter {
            status: Some(OrderStatus::InProgress),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].order_id, b.order_id);

    let today = chrono::Local::now().date_naive();
    let today_only = env
        .repos
        .order_repo
        .list(&OrderFilter {
            start_date: Some(today),
            end_date: Some(today),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(today_only.len(), 2);
}
