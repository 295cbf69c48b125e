//! 故事文本的内联标记渲染与展示辅助
//!
//! 故事 content 带一个极小的标记子集（粗体 / 斜体），storyType 对应固定的
//! 江湖事由标签，时间展示附带传统十二时辰。

use chrono::{DateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());

/// 将 `**粗体**` / `*斜体*` 渲染为 HTML 标签（先粗体后斜体，非贪婪）
pub fn render_markup(content: &str) -> String {
    let bolded = BOLD_RE.replace_all(content, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&bolded, "<em>$1</em>").into_owned()
}

/// 十二时辰，按两小时一格，子时跨 23 点与 0 点
const SHICHEN: [&str; 12] = [
    "子时", "丑时", "寅时", "卯时", "辰时", "巳时", "午时", "未时", "申时", "酉时", "戌时", "亥时",
];

/// 小时数对应的时辰名
pub fn shichen_label(hour: u32) -> &'static str {
    SHICHEN[(((hour + 1) % 24) / 2) as usize]
}

/// 故事时间展示：`YYYY-MM-DD HH:mm · 时辰`
///
/// 按时间戳自带的时区偏移展示，不做本地时区换算；解析失败时原样返回。
pub fn format_story_time(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => format!(
            "{} · {}",
            dt.format("%Y-%m-%d %H:%M"),
            shichen_label(dt.hour())
        ),
        Err(_) => iso.to_string(),
    }
}

/// storyType 对应的事由标签，未知类型返回 None
pub fn story_type_label(story_type: &str) -> Option<&'static str> {
    match story_type {
        "MEMBER_CREATE" => Some("初入江湖"),
        "WORLD_EXPLORE" => Some("游历天下"),
        "WORLD_FORTUNE" => Some("天降机缘"),
        "WORLD_TRIBULATION" => Some("历练劫难"),
        "WORLD_ROMANCE" => Some("缘起心间"),
        _ => None,
    }
}

/// identity_mode 对应的头像边框颜色：agent 红，human 蓝，否则默认边框色
pub fn avatar_border_color(identity_mode: Option<&str>) -> &'static str {
    match identity_mode {
        Some("agent") => "#b91c1c",
        Some("human") => "#2563eb",
        _ => "var(--orz-border)",
    }
}
