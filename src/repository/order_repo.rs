// ==========================================
// 拼盘库存台账系统 - 生产单数据仓储
// ==========================================
// 生产单主表 + 扣减明细子表 + 年度序号表
// 状态迁移使用条件更新 (WHERE status = 'IN_PROGRESS')，保证终态只进入一次
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, ts_column};
use crate::domain::order::{DebitedIngredient, OrderFilter, OrderNumber, ProductionOrder};
use crate::domain::types::{IngredientUnit, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, ToSql};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT order_id, order_number, recipe_id, recipe_name, quantity, status, notes,
           created_at, completed_at, cancelled_at
    FROM production_order
"#;

// ==========================================
// OrderRepository - 生产单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 单号序列
    // ==========================================

    /// 指定年份已发放的最大序号
    ///
    /// 取序号表与现存生产单两者的较大值，删除生产单不会导致序号回退
    pub fn last_sequence(&self, year: i32) -> RepositoryResult<Option<u32>> {
        let conn = self.get_conn()?;

        let recorded: Option<i64> = conn
            .query_row(
                "SELECT last_seq FROM order_sequence WHERE order_year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()?;
        let existing: Option<i64> = conn.query_row(
            "SELECT MAX(order_seq) FROM production_order WHERE order_year = ?1",
            params![year],
            |row| row.get(0),
        )?;

        Ok(recorded
            .into_iter()
            .chain(existing)
            .max()
            .map(|seq| seq.clamp(0, i64::from(u32::MAX)) as u32))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入生产单、扣减明细并推进年度序号（单事务）
    pub fn insert(&self, order: &ProductionOrder, number: &OrderNumber) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO production_order (
                order_id, order_number, order_year, order_seq, recipe_id, recipe_name,
                quantity, status, notes, created_at, completed_at, cancelled_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                order.order_id,
                order.order_number,
                number.year,
                number.sequence,
                order.recipe_id,
                order.recipe_name,
                order.quantity,
                order.status.as_str(),
                order.notes,
                format_ts(&order.created_at),
                order.completed_at.as_ref().map(format_ts),
                order.cancelled_at.as_ref().map(format_ts),
                format_ts(&order.created_at),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO order_debit (
                    order_id, position, ingredient_id, ingredient_name, quantity_debited, unit
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for (position, debit) in order.debited_ingredients.iter().enumerate() {
                stmt.execute(params![
                    order.order_id,
                    position as i64,
                    debit.ingredient_id,
                    debit.ingredient_name,
                    debit.quantity_debited,
                    debit.unit.as_str(),
                ])?;
            }
        }

        tx.execute(
            r#"
            INSERT INTO order_sequence (order_year, last_seq) VALUES (?1, ?2)
            ON CONFLICT(order_year) DO UPDATE SET last_seq = MAX(last_seq, excluded.last_seq)
            "#,
            params![number.year, number.sequence],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// 条件状态迁移: 仅当当前状态为 from 时更新为 to
    ///
    /// # 返回
    /// - Ok(true): 本次调用完成了迁移
    /// - Ok(false): 状态已不是 from（或记录不存在）
    pub fn transition_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        if !from.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let ts_column_name = match to {
            OrderStatus::Completed => "completed_at",
            OrderStatus::Cancelled => "cancelled_at",
            OrderStatus::InProgress => "updated_at",
        };
        let sql = format!(
            "UPDATE production_order SET status = ?1, {} = ?2, updated_at = ?2 \
             WHERE order_id = ?3 AND status = ?4",
            ts_column_name
        );

        let conn = self.get_conn()?;
        let rows = conn.execute(
            &sql,
            params![to.as_str(), format_ts(&at), order_id, from.as_str()],
        )?;
        Ok(rows == 1)
    }

    /// 更新备注
    pub fn update_notes(&self, order_id: &str, notes: Option<&str>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let now = chrono::Local::now().naive_local();
        let rows = conn.execute(
            "UPDATE production_order SET notes = ?1, updated_at = ?2 WHERE order_id = ?3",
            params![notes, format_ts(&now), order_id],
        )?;
        Ok(rows == 1)
    }

    /// 删除生产单（扣减明细级联删除，序号表保留）
    pub fn delete(&self, order_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM production_order WHERE order_id = ?1",
            params![order_id],
        )?;
        Ok(rows == 1)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE order_id = ?1", SELECT_COLUMNS);
        let header = conn.query_row(&sql, params![order_id], map_header).optional()?;

        match header {
            Some(mut order) => {
                order.debited_ingredients = load_debits(&conn, order_id)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// 按单号查询
    pub fn find_by_number(&self, order_number: &str) -> RepositoryResult<Option<ProductionOrder>> {
        let order_id: Option<String> = {
            let conn = self.get_conn()?;
            conn.query_row(
                "SELECT order_id FROM production_order WHERE order_number = ?1",
                params![order_number],
                |row| row.get(0),
            )
            .optional()?
        };

        match order_id {
            Some(id) => self.find_by_id(&id),
            None => Ok(None),
        }
    }

    /// 按筛选条件查询（新到旧）
    pub fn list(&self, filter: &OrderFilter) -> RepositoryResult<Vec<ProductionOrder>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE 1 = 1", SELECT_COLUMNS);
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str()));
        }
        if let Some(ts) = filter.start_date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            sql.push_str(" AND created_at >= ?");
            args.push(Box::new(format_ts(&ts)));
        }
        if let Some(ts) = filter
            .end_date
            .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
        {
            sql.push_str(" AND created_at <= ?");
            args.push(Box::new(format_ts(&ts)));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        let mut stmt = conn.prepare(&sql)?;
        let mut orders = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map_header)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut debits = load_all_debits(&conn)?;
        for order in orders.iter_mut() {
            order.debited_ingredients = debits.remove(&order.order_id).unwrap_or_default();
        }
        Ok(orders)
    }

    /// 查询全部进行中的生产单
    pub fn list_in_progress(&self) -> RepositoryResult<Vec<ProductionOrder>> {
        self.list(&OrderFilter {
            status: Some(OrderStatus::InProgress),
            ..Default::default()
        })
    }

    /// 按状态统计
    pub fn count_by_status(&self) -> RepositoryResult<HashMap<OrderStatus, u64>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM production_order GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, n)| {
                OrderStatus::from_db_str(&status).map(|s| (s, n.max(0) as u64))
            })
            .collect())
    }
}

// ==========================================
// 辅助方法
// ==========================================

fn load_debits(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<DebitedIngredient>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT ingredient_id, ingredient_name, quantity_debited, unit
        FROM order_debit
        WHERE order_id = ?1
        ORDER BY position ASC
        "#,
    )?;
    let debits = stmt
        .query_map(params![order_id], |row| map_debit(row, 0))?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(debits)
}

fn load_all_debits(conn: &Connection) -> RepositoryResult<HashMap<String, Vec<DebitedIngredient>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT order_id, ingredient_id, ingredient_name, quantity_debited, unit
        FROM order_debit
        ORDER BY order_id, position ASC
        "#,
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, map_debit(row, 1)?)))?
        .collect::<SqliteResult<Vec<_>>>()?;

    let mut grouped: HashMap<String, Vec<DebitedIngredient>> = HashMap::new();
    for (order_id, debit) in rows {
        grouped.entry(order_id).or_default().push(debit);
    }
    Ok(grouped)
}

fn map_debit(row: &Row, offset: usize) -> SqliteResult<DebitedIngredient> {
    let unit_str: String = row.get(offset + 3)?;
    let unit = IngredientUnit::from_db_str(&unit_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            rusqlite::types::Type::Text,
            format!("未知单位: {}", unit_str).into(),
        )
    })?;

    Ok(DebitedIngredient {
        ingredient_id: row.get(offset)?,
        ingredient_name: row.get(offset + 1)?,
        quantity_debited: row.get(offset + 2)?,
        unit,
    })
}

fn map_header(row: &Row) -> SqliteResult<ProductionOrder> {
    let status_str: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let completed_at: Option<String> = row.get(8)?;
    let cancelled_at: Option<String> = row.get(9)?;

    let status = OrderStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("未知生产单状态: {}", status_str).into(),
        )
    })?;

    Ok(ProductionOrder {
        order_id: row.get(0)?,
        order_number: row.get(1)?,
        recipe_id: row.get(2)?,
        recipe_name: row.get(3)?,
        quantity: row.get(4)?,
        status,
        debited_ingredients: Vec::new(),
        notes: row.get(6)?,
        created_at: ts_column(7, &created_at)?,
        completed_at: completed_at.as_deref().map(|s| ts_column(8, s)).transpose()?,
        cancelled_at: cancelled_at.as_deref().map(|s| ts_column(9, s)).transpose()?,
    })
}
