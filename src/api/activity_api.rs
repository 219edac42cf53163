// ==========================================
// 拼盘库存台账系统 - 活动日志 API
// ==========================================
// 职责: 活动日志分页查询（只读，日志只追加）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::LedgerConfigReader;
use crate::domain::activity::{ActivityFilter, ActivityPage, ActivityRecord, Pagination};
use crate::repository::activity_log_repo::ActivityLogRepository;

pub struct ActivityApi {
    activity_repo: Arc<ActivityLogRepository>,
    config: Arc<ConfigManager>,
}

impl ActivityApi {
    pub fn new(activity_repo: Arc<ActivityLogRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            activity_repo,
            config,
        }
    }

    /// 分页查询活动日志（新到旧）
    ///
    /// # 参数
    /// - page: 页码，从 1 开始，缺省 1
    /// - limit: 每页条数，缺省取配置值，超过上限时截断到上限
    pub fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> ApiResult<ActivityPage> {
        let pagination = self.resolve_pagination(page, limit)?;
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "开始日期 {} 晚于结束日期 {}",
                    start, end
                )));
            }
        }

        let (records, total) = self.activity_repo.query(filter, pagination)?;
        Ok(ActivityPage::new(records, pagination, total))
    }

    /// 查询单条活动
    pub fn get_activity(&self, activity_id: &str) -> ApiResult<ActivityRecord> {
        self.activity_repo
            .find_by_id(activity_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Activity(id={})不存在", activity_id)))
    }

    fn resolve_pagination(&self, page: Option<u32>, limit: Option<u32>) -> ApiResult<Pagination> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::InvalidInput("页码从 1 开始".to_string()));
        }

        let max = self.config.get_activity_max_page_size()?.max(1);
        let limit = match limit {
            Some(0) => return Err(ApiError::InvalidInput("每页条数必须大于 0".to_string())),
            Some(v) => v.min(max),
            None => self.config.get_activity_default_page_size()?.clamp(1, max),
        };
        Ok(Pagination::new(page, limit))
    }
}
