// ==========================================
// 拼盘库存台账系统 - 原料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据映射
// 数量写入只通过 compare_and_set_quantity（revision CAS）
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, ts_column};
use crate::domain::ingredient::{Ingredient, IngredientFilter};
use crate::domain::types::{IngredientCategory, IngredientUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT ingredient_id, name, category, is_custom, current_quantity, unit,
           low_stock_threshold, aliases_json, revision, created_at, updated_at
    FROM ingredient
"#;

// ==========================================
// IngredientRepository - 原料仓储
// ==========================================
pub struct IngredientRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IngredientRepository {
    /// 创建新的 IngredientRepository 实例
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
    // 写入操作
    // ==========================================

    /// 插入原料
    pub fn insert(&self, ingredient: &Ingredient) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ingredient (
                ingredient_id, name, category, is_custom, current_quantity, unit,
                low_stock_threshold, aliases_json, revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                ingredient.ingredient_id,
                ingredient.name,
                ingredient.category.as_str(),
                ingredient.is_custom,
                ingredient.current_quantity,
                ingredient.unit.as_str(),
                ingredient.low_stock_threshold,
                serde_json::to_string(&ingredient.aliases)?,
                ingredient.revision,
                format_ts(&ingredient.created_at),
                format_ts(&ingredient.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 更新原料元数据（名称/分类/单位/阈值/别名），不触碰数量
    pub fn update_metadata(&self, ingredient: &Ingredient) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE ingredient
               SET name = ?1, category = ?2, is_custom = ?3, unit = ?4,
                   low_stock_threshold = ?5, aliases_json = ?6, updated_at = ?7
             WHERE ingredient_id = ?8
            "#,
            params![
                ingredient.name,
                ingredient.category.as_str(),
                ingredient.is_custom,
                ingredient.unit.as_str(),
                ingredient.low_stock_threshold,
                serde_json::to_string(&ingredient.aliases)?,
                format_ts(&ingredient.updated_at),
                ingredient.ingredient_id,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::not_found("Ingredient", &ingredient.ingredient_id));
        }
        Ok(())
    }

    /// 按 revision 做比较并写入数量
    ///
    /// # 返回
    /// - Ok(true): 写入成功，revision + 1
    /// - Ok(false): revision 已变化或记录已被删除（由调用方重读判断）
    pub fn compare_and_set_quantity(
        &self,
        ingredient_id: &str,
        expected_revision: i64,
        new_quantity: f64,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let now = chrono::Local::now().naive_local();
        let rows = conn.execute(
            r#"
            UPDATE ingredient
               SET current_quantity = ?1, revision = revision + 1, updated_at = ?2
             WHERE ingredient_id = ?3 AND revision = ?4
            "#,
            params![new_quantity, format_ts(&now), ingredient_id, expected_revision],
        )?;
        Ok(rows == 1)
    }

    /// 删除原料，返回被删除的记录
    pub fn delete(&self, ingredient_id: &str) -> RepositoryResult<Option<Ingredient>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let existing = {
            let sql = format!("{} WHERE ingredient_id = ?1", SELECT_COLUMNS);
            tx.query_row(&sql, params![ingredient_id], map_row).optional()?
        };

        if existing.is_some() {
            tx.execute(
                "DELETE FROM ingredient WHERE ingredient_id = ?1",
                params![ingredient_id],
            )?;
        }

        tx.commit()?;
        Ok(existing)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, ingredient_id: &str) -> RepositoryResult<Option<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE ingredient_id = ?1", SELECT_COLUMNS);
        let ingredient = conn
            .query_row(&sql, params![ingredient_id], map_row)
            .optional()?;
        Ok(ingredient)
    }

    /// 按名称查询（名称唯一，区分大小写）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE name = ?1", SELECT_COLUMNS);
        let ingredient = conn.query_row(&sql, params![name], map_row).optional()?;
        Ok(ingredient)
    }

    /// 查询全部原料（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY name COLLATE NOCASE ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按筛选条件查询
    ///
    /// 分类/自定义标记在 SQL 中过滤；低库存与名称/别名搜索在内存中过滤
    pub fn list(&self, filter: &IngredientFilter) -> RepositoryResult<Vec<Ingredient>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE 1 = 1", SELECT_COLUMNS);
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.as_str()));
        }
        if let Some(is_custom) = filter.is_custom {
            sql.push_str(" AND is_custom = ?");
            args.push(Box::new(is_custom));
        }
        sql.push_str(" ORDER BY name COLLATE NOCASE ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let search = filter.search.as_deref().unwrap_or("");
        Ok(rows
            .into_iter()
            .filter(|ing| !filter.low_stock_only || ing.is_low_stock())
            .filter(|ing| ing.matches_search(search))
            .collect())
    }

    /// 库存快照：ingredient_id → current_quantity
    pub fn quantity_snapshot(&self) -> RepositoryResult<HashMap<String, f64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT ingredient_id, current_quantity FROM ingredient")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<SqliteResult<HashMap<_, _>>>()?;
        Ok(rows)
    }

    /// 统计原料总数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ingredient", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

// ==========================================
// 辅助方法
// ==========================================

/// 将数据库行映射为 Ingredient 实体
fn map_row(row: &Row) -> SqliteResult<Ingredient> {
    let category: String = row.get(2)?;
    let unit_str: String = row.get(5)?;
    let aliases_json: String = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    let unit = IngredientUnit::from_db_str(&unit_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("未知单位: {}", unit_str).into(),
        )
    })?;

    Ok(Ingredient {
        ingredient_id: row.get(0)?,
        name: row.get(1)?,
        category: IngredientCategory::from_db_str(&category),
        is_custom: row.get(3)?,
        current_quantity: row.get(4)?,
        unit,
        low_stock_threshold: row.get(6)?,
        aliases: serde_json::from_str(&aliases_json).unwrap_or_default(),
        revision: row.get(8)?,
        created_at: ts_column(9, &created_at)?,
        updated_at: ts_column(10, &updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IngredientCategory;

    fn setup_repo() -> IngredientRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        IngredientRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn make_ingredient(id: &str, name: &str, qty: f64, threshold: f64) -> Ingredient {
        let now = chrono::Local::now().naive_local();
        Ingredient {
            ingredient_id: id.to_string(),
            name: name.to_string(),
            category: IngredientCategory::Cheese,
            is_custom: false,
            current_quantity: qty,
            unit: IngredientUnit::Oz,
            low_stock_threshold: threshold,
            aliases: vec![],
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();

        let found = repo.find_by_id("I1").unwrap().unwrap();
        assert_eq!(found.name, "Brie");
        assert_eq!(found.current_quantity, 10.0);
        assert_eq!(found.unit, IngredientUnit::Oz);

        assert!(repo.find_by_name("Brie").unwrap().is_some());
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_is_unique_violation() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();
        let err = repo
            .insert(&make_ingredient("I2", "Brie", 1.0, 4.0))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_compare_and_set_checks_revision() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();

        assert!(repo.compare_and_set_quantity("I1", 0, 7.0).unwrap());
        // revision 已变为 1，旧 revision 写入失败
        assert!(!repo.compare_and_set_quantity("I1", 0, 1.0).unwrap());

        let found = repo.find_by_id("I1").unwrap().unwrap();
        assert_eq!(found.current_quantity, 7.0);
        assert_eq!(found.revision, 1);

        assert!(!repo.compare_and_set_quantity("missing", 0, 1.0).unwrap());
    }

    #[test]
    fn test_negative_quantity_rejected_by_schema() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();
        let err = repo.compare_and_set_quantity("I1", 0, -1.0).unwrap_err();
        assert!(matches!(err, RepositoryError::CheckConstraintViolation(_)));
        assert_eq!(repo.find_by_id("I1").unwrap().unwrap().current_quantity, 10.0);
    }

    #[test]
    fn test_list_with_filter() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "brie", 10.0, 4.0)).unwrap();
        let mut salami = make_ingredient("I2", "Salami", 2.0, 4.0);
        salami.category = IngredientCategory::Meat;
        salami.aliases = vec!["Soppressata".to_string()];
        repo.insert(&salami).unwrap();

        let all = repo.list(&IngredientFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "brie"); // NOCASE 排序

        let low = repo
            .list(&IngredientFilter {
                low_stock_only: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].ingredient_id, "I2");

        let by_alias = repo
            .list(&IngredientFilter {
                search: Some("soppr".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_alias.len(), 1);

        let meats = repo
            .list(&IngredientFilter {
                category: Some(IngredientCategory::Meat),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(meats.len(), 1);
        assert_eq!(meats[0].aliases, vec!["Soppressata".to_string()]);
    }

    #[test]
    fn test_delete_returns_removed_row() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();

        let removed = repo.delete("I1").unwrap().unwrap();
        assert_eq!(removed.name, "Brie");
        assert!(repo.delete("I1").unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_quantity_snapshot() {
        let repo = setup_repo();
        repo.insert(&make_ingredient("I1", "Brie", 10.0, 4.0)).unwrap();
        repo.insert(&make_ingredient("I2", "Gouda", 3.5, 4.0)).unwrap();

        let snapshot = repo.quantity_snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["I2"], 3.5);
    }
}
