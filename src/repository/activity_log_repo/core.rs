use crate::db::format_ts;
use crate::domain::activity::ActivityRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActivityLogRepository - 活动日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActivityLogRepository {
    conn: Arc<Mutex<Connection>>,
}

const INSERT_SQL: &str = r#"
    INSERT INTO activity_log (
        activity_id, activity_type, ingredient_id, order_id,
        payload_json, metadata_json, activity_ts
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

impl ActivityLogRepository {
    /// 创建新的活动日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加一条活动记录
    ///
    /// # 返回
    /// - `Ok(activity_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, record: &ActivityRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_with(&conn, record)?;
        Ok(record.activity_id.clone())
    }

    /// 批量追加（单事务，保持传入顺序）
    pub fn batch_insert(&self, records: &[ActivityRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for record in records {
            insert_with(&tx, record)?;
        }

        tx.commit()?;
        Ok(records.len())
    }
}

fn insert_with(conn: &Connection, record: &ActivityRecord) -> RepositoryResult<()> {
    conn.execute(
        INSERT_SQL,
        params![
            record.activity_id,
            record.activity_type().as_str(),
            record.payload.ingredient_id(),
            record.payload.order_id(),
            serde_json::to_string(&record.payload)?,
            record.metadata.as_ref().map(|v| v.to_string()),
            format_ts(&record.activity_ts),
        ],
    )?;
    Ok(())
}
