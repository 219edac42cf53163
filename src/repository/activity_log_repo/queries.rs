use super::core::ActivityLogRepository;
use crate::db::{format_ts, ts_column};
use crate::domain::activity::{ActivityFilter, ActivityPayload, ActivityRecord, Pagination};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row, ToSql};

const SELECT_COLUMNS: &str = r#"
    SELECT activity_id, payload_json, metadata_json, activity_ts
    FROM activity_log
"#;

impl ActivityLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 activity_id 查询单条记录
    pub fn find_by_id(&self, activity_id: &str) -> RepositoryResult<Option<ActivityRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE activity_id = ?1", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![activity_id], map_row)
            .optional()?;
        Ok(record)
    }

    /// 按条件分页查询（新到旧）
    ///
    /// # 返回
    /// - (当前页记录, 满足条件的总条数)
    pub fn query(
        &self,
        filter: &ActivityFilter,
        pagination: Pagination,
    ) -> RepositoryResult<(Vec<ActivityRecord>, u64)> {
        let conn = self.get_conn()?;
        let (where_sql, args) = build_where(filter);

        let count_sql = format!("SELECT COUNT(*) FROM activity_log {}", where_sql);
        let total: i64 = conn.query_row(
            &count_sql,
            rusqlite::params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let page_sql = format!(
            "{} {} ORDER BY activity_ts DESC, rowid DESC LIMIT {} OFFSET {}",
            SELECT_COLUMNS,
            where_sql,
            pagination.limit,
            pagination.offset()
        );
        let mut stmt = conn.prepare(&page_sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((records, total.max(0) as u64))
    }

    /// 最近 N 条活动（新到旧）
    pub fn find_recent(&self, limit: u32) -> RepositoryResult<Vec<ActivityRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} ORDER BY activity_ts DESC, rowid DESC LIMIT ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 统计全部活动条数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM activity_log", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

// ==========================================
// 辅助方法
// ==========================================

fn build_where(filter: &ActivityFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(activity_type) = filter.activity_type {
        clauses.push("activity_type = ?");
        args.push(Box::new(activity_type.as_str()));
    }
    if let Some(ingredient_id) = &filter.ingredient_id {
        clauses.push("ingredient_id = ?");
        args.push(Box::new(ingredient_id.clone()));
    }
    if let Some(order_id) = &filter.order_id {
        clauses.push("order_id = ?");
        args.push(Box::new(order_id.clone()));
    }
    if let Some(start) = filter.start_date {
        if let Some(ts) = start.and_hms_opt(0, 0, 0) {
            clauses.push("activity_ts >= ?");
            args.push(Box::new(format_ts(&ts)));
        }
    }
    if let Some(end) = filter.end_date {
        if let Some(ts) = end.and_hms_micro_opt(23, 59, 59, 999_999) {
            clauses.push("activity_ts <= ?");
            args.push(Box::new(format_ts(&ts)));
        }
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), args)
    }
}

/// 将数据库行映射为 ActivityRecord
fn map_row(row: &Row) -> SqliteResult<ActivityRecord> {
    let payload_json: String = row.get(1)?;
    let metadata_json: Option<String> = row.get(2)?;
    let activity_ts: String = row.get(3)?;

    let payload: ActivityPayload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ActivityRecord {
        activity_id: row.get(0)?,
        payload,
        activity_ts: ts_column(3, &activity_ts)?,
        metadata: metadata_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}
