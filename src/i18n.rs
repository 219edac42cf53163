// ==========================================
// 拼盘库存台账系统 - 文案本地化
// ==========================================
// 职责: 采购清单明细、概览摘要等面向人的文案
// 说明: 文案表位于 locales/，i18n! 宏在 lib.rs 中展开；默认 zh-CN
// ==========================================

/// 已提供文案表的语言
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言
///
/// 未提供文案表的语言代码被忽略并返回 false，当前语言保持不变
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale = locale, "不支持的语言，保持 {}", current_locale());
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 取文案并替换 `%{name}` 占位
///
/// ```no_run
/// use board_ledger::i18n::t_with_args;
/// let headline = t_with_args("dashboard.low_stock_headline", &[("count", "3")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}

/// 文案中的数量: 保留至多两位小数并去掉末尾的 0
///
/// 份数乘单份用量会带出 0.30000000000000004 这类浮点尾巴
pub fn format_quantity(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 是进程级全局状态，相关测试串行执行
    static LOCALE_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_unsupported_locale_is_ignored() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), "en");
        assert!(set_locale("zh-CN"));
        assert_eq!(current_locale(), "zh-CN");
    }

    #[test]
    fn test_headline_in_both_locales() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let zh = t_with_args("dashboard.low_stock_headline", &[("count", "3")]);
        assert!(zh.contains('3') && zh.contains("低库存"), "{}", zh);

        set_locale("en");
        let en = t_with_args("dashboard.low_stock_headline", &[("count", "3")]);
        assert!(en.contains('3') && en.contains("low on stock"), "{}", en);
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("zh-CN");
    }

    #[test]
    fn test_shopping_details_fill_every_placeholder() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        for locale in SUPPORTED_LOCALES {
            set_locale(locale);
            let msg = t_with_args(
                "shopping.low_stock_detail",
                &[("available", "2"), ("threshold", "5")],
            );
            assert!(msg.contains('2') && msg.contains('5'), "{}: {}", locale, msg);
            assert!(!msg.contains("%{"), "{}: {}", locale, msg);
        }
        set_locale("zh-CN");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(0.1 + 0.2), "0.3");
        assert_eq!(format_quantity(8.0), "8");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.126), "0.13");
        assert_eq!(format_quantity(-0.001), "0");
    }
}
