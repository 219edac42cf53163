// ==========================================
// 拼盘库存台账系统 - 输入校验器
// ==========================================
// 职责: API 入口处的输入校验（名称、备注长度、配方原料行）
// 红线: 校验失败不产生任何状态变更
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::recipe::RecipeIngredient;

/// 校验名称非空，返回去除首尾空白后的名称
pub fn validate_name(field: &str, name: &str) -> ApiResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

/// 校验备注长度（按字符计）
pub fn validate_notes(notes: Option<&str>, max_len: usize) -> ApiResult<()> {
    if let Some(n) = notes {
        let len = n.chars().count();
        if len > max_len {
            return Err(ApiError::InvalidInput(format!(
                "备注长度 {} 超过上限 {}",
                len, max_len
            )));
        }
    }
    Ok(())
}

/// 校验配方原料行
///
/// # 规则
/// - 至少一行
/// - 每行单份用量为正的有限数值
/// - 原料ID非空
pub fn validate_recipe_lines(lines: &[RecipeIngredient]) -> ApiResult<()> {
    if lines.is_empty() {
        return Err(ApiError::InvalidInput("配方至少需要一种原料".to_string()));
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.ingredient_id.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "第 {} 行原料ID不能为空",
                idx + 1
            )));
        }
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(ApiError::InvalidQuantity(format!(
                "原料 {} 的单份用量必须为正数: {}",
                line.ingredient_name, line.quantity
            )));
        }
    }
    Ok(())
}
