// ==========================================
// 拼盘库存台账系统 - 活动日志数据仓储
// ==========================================
// 红线: 只追加，不提供更新/删除
// 排序: activity_ts DESC, rowid DESC（同一时间戳按写入顺序倒序）
// ==========================================

mod core;
mod queries;


pub use core::ActivityLogRepository;
