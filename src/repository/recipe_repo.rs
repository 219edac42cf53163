// ==========================================
// 拼盘库存台账系统 - 配方数据仓储
// ==========================================
// 配方主表 + 原料行子表；写入走单事务，原料行整体替换
// 排序: 分类 → display_order → 名称
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, ts_column};
use crate::domain::recipe::{Recipe, RecipeFilter, RecipeIngredient};
use crate::domain::types::{IngredientUnit, RecipeCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, ToSql};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT recipe_id, name, category, display_order, is_active, created_at, updated_at
    FROM recipe
"#;

// ==========================================
// RecipeRepository - 配方仓储
// ==========================================
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecipeRepository {
    /// 创建新的 RecipeRepository 实例
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

    /// 插入配方及其原料行（单事务）
    pub fn insert(&self, recipe: &Recipe) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO recipe (
                recipe_id, name, category, display_order, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                recipe.recipe_id,
                recipe.name,
                recipe.category.as_str(),
                recipe.display_order,
                recipe.is_active,
                format_ts(&recipe.created_at),
                format_ts(&recipe.updated_at),
            ],
        )?;
        insert_lines(&tx, &recipe.recipe_id, &recipe.ingredients)?;

        tx.commit()?;
        Ok(())
    }

    /// 更新配方（主表字段 + 原料行整体替换，单事务）
    pub fn update(&self, recipe: &Recipe) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE recipe
               SET name = ?1, category = ?2, display_order = ?3, is_active = ?4, updated_at = ?5
             WHERE recipe_id = ?6
            "#,
            params![
                recipe.name,
                recipe.category.as_str(),
                recipe.display_order,
                recipe.is_active,
                format_ts(&recipe.updated_at),
                recipe.recipe_id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Recipe", &recipe.recipe_id));
        }

        tx.execute(
            "DELETE FROM recipe_ingredient WHERE recipe_id = ?1",
            params![recipe.recipe_id],
        )?;
        insert_lines(&tx, &recipe.recipe_id, &recipe.ingredients)?;

        tx.commit()?;
        Ok(())
    }

    /// 删除配方（原料行级联删除）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在
    pub fn delete(&self, recipe_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM recipe WHERE recipe_id = ?1", params![recipe_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, recipe_id: &str) -> RepositoryResult<Option<Recipe>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE recipe_id = ?1", SELECT_COLUMNS);
        let header = conn.query_row(&sql, params![recipe_id], map_header).optional()?;

        match header {
            Some(mut recipe) => {
                recipe.ingredients = load_lines(&conn, recipe_id)?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// 按名称查询
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Recipe>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE name = ?1", SELECT_COLUMNS);
        let header = conn.query_row(&sql, params![name], map_header).optional()?;

        match header {
            Some(mut recipe) => {
                recipe.ingredients = load_lines(&conn, &recipe.recipe_id)?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// 按筛选条件查询（分类 → display_order → 名称）
    pub fn list(&self, filter: &RecipeFilter) -> RepositoryResult<Vec<Recipe>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE 1 = 1", SELECT_COLUMNS);
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            sql.push_str(" AND is_active = ?");
            args.push(Box::new(is_active));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut recipes = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map_header)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut lines = load_all_lines(&conn)?;
        for recipe in recipes.iter_mut() {
            recipe.ingredients = lines.remove(&recipe.recipe_id).unwrap_or_default();
        }

        // 分类顺序以枚举声明顺序为准，不依赖字符串字典序
        recipes.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.display_order.cmp(&b.display_order))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(recipes)
    }

    /// 查询全部配方
    pub fn list_all(&self) -> RepositoryResult<Vec<Recipe>> {
        self.list(&RecipeFilter::default())
    }

    /// 查询引用了指定原料的配方
    pub fn find_using_ingredient(&self, ingredient_id: &str) -> RepositoryResult<Vec<Recipe>> {
        let recipe_ids: Vec<String> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                "SELECT DISTINCT recipe_id FROM recipe_ingredient WHERE ingredient_id = ?1",
            )?;
            let ids = stmt
                .query_map(params![ingredient_id], |row| row.get(0))?
                .collect::<SqliteResult<Vec<_>>>()?;
            ids
        };

        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| recipe_ids.contains(&r.recipe_id))
            .collect())
    }

    /// 统计配方总数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipe", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

// ==========================================
// 辅助方法
// ==========================================

fn insert_lines(
    conn: &Connection,
    recipe_id: &str,
    lines: &[RecipeIngredient],
) -> RepositoryResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO recipe_ingredient (
            recipe_id, position, ingredient_id, ingredient_name, quantity, unit, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;
    for (position, line) in lines.iter().enumerate() {
        stmt.execute(params![
            recipe_id,
            position as i64,
            line.ingredient_id,
            line.ingredient_name,
            line.quantity,
            line.unit.as_str(),
            line.notes,
        ])?;
    }
    Ok(())
}

fn load_lines(conn: &Connection, recipe_id: &str) -> RepositoryResult<Vec<RecipeIngredient>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT ingredient_id, ingredient_name, quantity, unit, notes
        FROM recipe_ingredient
        WHERE recipe_id = ?1
        ORDER BY position ASC
        "#,
    )?;
    let lines = stmt
        .query_map(params![recipe_id], |row| map_line(row, 0))?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(lines)
}

fn load_all_lines(conn: &Connection) -> RepositoryResult<HashMap<String, Vec<RecipeIngredient>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT recipe_id, ingredient_id, ingredient_name, quantity, unit, notes
        FROM recipe_ingredient
        ORDER BY recipe_id, position ASC
        "#,
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, map_line(row, 1)?)))?
        .collect::<SqliteResult<Vec<_>>>()?;

    let mut grouped: HashMap<String, Vec<RecipeIngredient>> = HashMap::new();
    for (recipe_id, line) in rows {
        grouped.entry(recipe_id).or_default().push(line);
    }
    Ok(grouped)
}

/// 映射原料行，offset 为 ingredient_id 所在列
fn map_line(row: &Row, offset: usize) -> SqliteResult<RecipeIngredient> {
    let unit_str: String = row.get(offset + 3)?;
    let unit = IngredientUnit::from_db_str(&unit_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            rusqlite::types::Type::Text,
            format!("未知单位: {}", unit_str).into(),
        )
    })?;

    Ok(RecipeIngredient {
        ingredient_id: row.get(offset)?,
        ingredient_name: row.get(offset + 1)?,
        quantity: row.get(offset + 2)?,
        unit,
        notes: row.get(offset + 4)?,
    })
}

/// 映射配方主表行（原料行另行加载）
fn map_header(row: &Row) -> SqliteResult<Recipe> {
    let category_str: String = row.get(2)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    let category = RecipeCategory::from_db_str(&category_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("未知配方分类: {}", category_str).into(),
        )
    })?;

    Ok(Recipe {
        recipe_id: row.get(0)?,
        name: row.get(1)?,
        category,
        display_order: row.get(3)?,
        ingredients: Vec::new(),
        is_active: row.get(4)?,
        created_at: ts_column(5, &created_at)?,
        updated_at: ts_column(6, &updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> RecipeRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        RecipeRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn line(id: &str, qty: f64) -> RecipeIngredient {
        RecipeIngredient {
            ingredient_id: id.to_string(),
            ingredient_name: format!("name-{}", id),
            quantity: qty,
            unit: IngredientUnit::Oz,
            notes: None,
        }
    }

    fn make_recipe(id: &str, name: &str, category: RecipeCategory, order: i32) -> Recipe {
        let now = chrono::Local::now().naive_local();
        Recipe {
            recipe_id: id.to_string(),
            name: name.to_string(),
            category,
            display_order: order,
            ingredients: vec![line("I1", 2.0), line("I2", 3.0)],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find_keeps_line_order() {
        let repo = setup_repo();
        repo.insert(&make_recipe("R1", "Classic Board", RecipeCategory::Classic, 1))
            .unwrap();

        let found = repo.find_by_id("R1").unwrap().unwrap();
        assert_eq!(found.ingredients.len(), 2);
        assert_eq!(found.ingredients[0].ingredient_id, "I1");
        assert_eq!(found.ingredients[1].quantity, 3.0);
        assert!(repo.find_by_name("Classic Board").unwrap().is_some());
    }

    #[test]
    fn test_update_replaces_lines() {
        let repo = setup_repo();
        let mut recipe = make_recipe("R1", "Classic Board", RecipeCategory::Classic, 1);
        repo.insert(&recipe).unwrap();

        recipe.ingredients = vec![line("I3", 1.0)];
        recipe.is_active = false;
        repo.update(&recipe).unwrap();

        let found = repo.find_by_id("R1").unwrap().unwrap();
        assert_eq!(found.ingredients, vec![line("I3", 1.0)]);
        assert!(!found.is_active);

        let missing = make_recipe("R9", "Ghost", RecipeCategory::Sweet, 0);
        assert!(matches!(
            repo.update(&missing).unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }

    #[test]
    fn test_list_sorted_by_category_then_display_order() {
        let repo = setup_repo();
        repo.insert(&make_recipe("R1", "Dessert", RecipeCategory::Sweet, 0)).unwrap();
        repo.insert(&make_recipe("R2", "Big", RecipeCategory::Classic, 2)).unwrap();
        repo.insert(&make_recipe("R3", "Small", RecipeCategory::Classic, 1)).unwrap();

        let names: Vec<_> = repo.list_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Small", "Big", "Dessert"]);

        let sweets = repo
            .list(&RecipeFilter {
                category: Some(RecipeCategory::Sweet),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sweets.len(), 1);
        assert_eq!(sweets[0].ingredients.len(), 2);
    }

    #[test]
    fn test_find_using_ingredient_and_delete() {
        let repo = setup_repo();
        repo.insert(&make_recipe("R1", "A", RecipeCategory::Classic, 0)).unwrap();
        let mut other = make_recipe("R2", "B", RecipeCategory::Keto, 0);
        other.ingredients = vec![line("I9", 1.0)];
        repo.insert(&other).unwrap();

        let using = repo.find_using_ingredient("I2").unwrap();
        assert_eq!(using.len(), 1);
        assert_eq!(using[0].recipe_id, "R1");

        assert!(repo.delete("R1").unwrap());
        assert!(!repo.delete("R1").unwrap());
        assert!(repo.find_using_ingredient("I2").unwrap().is_empty());
        assert_eq!(repo.count().unwrap(), 1);
    }
}
